use hasharr::{calculate_required_size, Config, Error, FlatHashTable, HEADER_SIZE, SLOT_SIZE};
use test_log::test;

#[test]
fn table_write_and_read() -> hasharr::Result<()> {
    let mut table = Config::new(10).create_in_memory()?;

    table.put("e1", "a")?;
    table.put("e2", "b")?;
    table.put("e2", "c")?;
    table.put("e3", "d")?;

    assert_eq!(3, table.size().entries);
    assert_eq!(b"c".to_vec(), table.get("e2")?);

    table.remove("e1")?;
    assert_eq!(2, table.size().entries);
    assert!(matches!(table.get("e1"), Err(Error::NotFound)));

    table.verify()?;

    Ok(())
}

#[test]
fn table_round_trip() -> hasharr::Result<()> {
    let mut table = Config::new(500).create_in_memory()?;

    let items = (0..100)
        .map(|i| (format!("key-{i}"), nanoid::nanoid!().into_bytes()))
        .collect::<Vec<_>>();

    for (key, value) in &items {
        table.put(key, value)?;
    }

    for (key, value) in &items {
        assert_eq!(*value, table.get(key)?);
    }

    assert_eq!(items.len(), table.len());
    table.verify()?;

    Ok(())
}

#[test]
fn table_update_keeps_entry_count() -> hasharr::Result<()> {
    let mut table = Config::new(10).create_in_memory()?;

    table.put("k", "v1")?;
    let before = table.len();

    table.put("k", "v2")?;

    assert_eq!(before, table.len());
    assert_eq!(b"v2".to_vec(), table.get("k")?);
    assert_eq!(1, table.iter().count());

    Ok(())
}

#[test]
fn table_update_shrinks_and_grows_value() -> hasharr::Result<()> {
    let mut table = Config::new(10).create_in_memory()?;

    table.put("k", vec![1; 200])?;
    assert_eq!(4, table.size().used_slots);

    table.put("k", "tiny")?;
    assert_eq!(1, table.size().used_slots);

    table.put("k", vec![2; 100])?;
    assert_eq!(3, table.size().used_slots);
    assert_eq!(vec![2; 100], table.get("k")?);

    table.verify()?;

    Ok(())
}

#[test]
fn table_capacity_bound() -> hasharr::Result<()> {
    const N: usize = 32;

    let mut table = Config::new(N).create_in_memory()?;

    for i in 0..N {
        table.put(format!("{i}"), "v")?;
    }

    assert_eq!(N, table.size().used_slots);
    assert!(matches!(table.put("one-more", "v"), Err(Error::OutOfSpace)));
    assert_eq!(N, table.size().used_slots);
    assert_eq!(N, table.len());

    // A full table rejects every put, updates included
    assert!(matches!(table.put("0", "w"), Err(Error::OutOfSpace)));

    table.remove("0")?;
    table.put("one-more", "v")?;
    assert_eq!(N, table.len());

    table.verify()?;

    Ok(())
}

#[test]
fn table_construction_boundary() -> hasharr::Result<()> {
    let one_slot = HEADER_SIZE + SLOT_SIZE;
    assert_eq!(Some(one_slot), calculate_required_size(1));

    let table = FlatHashTable::create(vec![0; one_slot])?;
    assert_eq!(1, table.capacity());

    assert!(matches!(
        FlatHashTable::create(vec![0; one_slot - 1]),
        Err(Error::InvalidSize { .. })
    ));

    assert!(matches!(
        FlatHashTable::create(Vec::new()),
        Err(Error::InvalidSize { .. })
    ));

    Ok(())
}

#[test]
fn table_create_in_caller_block() -> hasharr::Result<()> {
    let config = Config::new(8);

    let mut block = vec![0; config.memory_size()?];
    let mut table = config.create_in(&mut block[..])?;

    table.put("a", "1")?;
    assert_eq!(8, table.capacity());

    assert!(matches!(
        config.create_in(vec![0; config.memory_size()? - 1]),
        Err(Error::InvalidSize { .. })
    ));

    Ok(())
}

#[test]
fn table_slot_count_overflow_is_an_error() {
    let slots = usize::MAX / SLOT_SIZE + 1;

    assert_eq!(None, calculate_required_size(slots));
    assert!(matches!(
        Config::new(slots).create_in_memory(),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        Config::new(0).memory_size(),
        Err(Error::InvalidSize { .. })
    ));
}

#[test]
fn table_load_factor() -> hasharr::Result<()> {
    let mut table = Config::new(4).create_in_memory()?;

    assert!(table.size().load_factor().abs() < f64::EPSILON);

    table.put("a", "1")?;
    table.put("b", "2")?;

    assert!((table.size().load_factor() - 0.5).abs() < f64::EPSILON);

    Ok(())
}
