use hasharr::{Config, Error, FlatHashTable};
use memmap2::MmapMut;
use std::fs::OpenOptions;
use test_log::test;

#[test]
fn table_open_existing_block() -> hasharr::Result<()> {
    let mut table = Config::new(32).create_in_memory()?;

    table.put_str("a", "1")?;
    table.put("b", vec![9; 120])?;

    let block = table.into_inner();

    // Another handle, e.g. in another process, attaches to the same bytes
    let mut table = FlatHashTable::open(block)?;
    assert_eq!(2, table.len());
    assert_eq!("1", table.get_str("a")?);
    assert_eq!(vec![9; 120], table.get("b")?);

    table.remove("a")?;
    assert_eq!(1, table.len());

    Ok(())
}

#[test]
fn table_open_read_only() -> hasharr::Result<()> {
    let mut table = Config::new(32).create_in_memory()?;
    table.put_str("a", "1")?;

    let block = table.into_inner();
    let table = FlatHashTable::open(block.as_slice())?;

    assert_eq!("1", table.get_str("a")?);
    assert_eq!(1, table.iter().count());
    table.verify()?;

    Ok(())
}

#[test]
fn table_open_rejects_foreign_bytes() {
    assert!(matches!(
        FlatHashTable::open(&b"definitely not a hash table"[..]),
        Err(Error::InvalidHeader(_))
    ));
    assert!(matches!(
        FlatHashTable::open(&b"QHA"[..]),
        Err(Error::InvalidHeader(_))
    ));
}

#[test]
fn table_open_rejects_unknown_version() -> hasharr::Result<()> {
    let mut block = Config::new(4).create_in_memory()?.into_inner();
    block[3] = 99;

    assert!(matches!(
        FlatHashTable::open(block),
        Err(Error::InvalidVersion(99))
    ));

    Ok(())
}

#[test]
fn table_memory_mapped_file() -> hasharr::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("table");

    let config = Config::new(64);

    {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(config.memory_size()? as u64)?;

        let mmap = unsafe { MmapMut::map_mut(&file)? };
        let mut table = config.create_in(mmap)?;

        for i in 0..20 {
            table.put_int(format!("counter-{i}"), i)?;
        }
        table.put("blob", vec![3; 250])?;

        table.get_ref().flush()?;
    }

    let file = OpenOptions::new().read(true).write(true).open(&path)?;
    let mmap = unsafe { MmapMut::map_mut(&file)? };
    let table = FlatHashTable::open(mmap)?;

    assert_eq!(21, table.len());
    for i in 0..20 {
        assert_eq!(i, table.get_int(format!("counter-{i}"))?);
    }
    assert_eq!(vec![3; 250], table.get("blob")?);
    table.verify()?;

    Ok(())
}
