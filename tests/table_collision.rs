use hasharr::{hash::hash32, Config, Error, FlatHashTable};
use test_log::test;

const SLOTS: usize = 16;

/// Finds `n` distinct keys that share the same home slot.
fn colliding_keys(n: usize) -> Vec<String> {
    let home = hash32(b"anchor") % SLOTS as u32;

    (0..)
        .map(|i| format!("c{i}"))
        .filter(|k| hash32(k.as_bytes()) % SLOTS as u32 == home)
        .take(n)
        .collect()
}

fn table() -> hasharr::Result<FlatHashTable<Vec<u8>>> {
    Config::new(SLOTS).create_in_memory()
}

#[test]
fn table_collision_both_readable() -> hasharr::Result<()> {
    let mut table = table()?;
    let keys = colliding_keys(2);

    table.put(&keys[0], "v1")?;
    table.put(&keys[1], "v2")?;

    assert_eq!(b"v1".to_vec(), table.get(&keys[0])?);
    assert_eq!(b"v2".to_vec(), table.get(&keys[1])?);
    assert_eq!(2, table.len());
    table.verify()?;

    Ok(())
}

#[test]
fn table_collision_remove_home_occupant() -> hasharr::Result<()> {
    let mut table = table()?;
    let keys = colliding_keys(2);

    table.put(&keys[0], "v1")?;
    table.put(&keys[1], "v2")?;

    table.remove(&keys[0])?;

    assert!(matches!(table.get(&keys[0]), Err(Error::NotFound)));
    assert_eq!(b"v2".to_vec(), table.get(&keys[1])?);
    assert_eq!(1, table.size().entries);
    table.verify()?;

    Ok(())
}

#[test]
fn table_collision_remove_in_any_order() -> hasharr::Result<()> {
    let keys = colliding_keys(4);

    for skip in 0..keys.len() {
        let mut table = table()?;

        for (i, key) in keys.iter().enumerate() {
            table.put(key, vec![i as u8; 40 * i])?;
        }

        table.remove(&keys[skip])?;
        table.verify()?;

        for (i, key) in keys.iter().enumerate() {
            if i == skip {
                assert!(!table.contains_key(key)?);
            } else {
                assert_eq!(vec![i as u8; 40 * i], table.get(key)?);
            }
        }
    }

    Ok(())
}

#[test]
fn table_collision_chain_with_large_values() -> hasharr::Result<()> {
    let mut table = table()?;
    let keys = colliding_keys(3);

    let big = (0..=255).cycle().take(150).collect::<Vec<u8>>();

    table.put(&keys[0], &big)?;
    table.put(&keys[1], &big)?;
    table.put(&keys[2], "small")?;
    table.verify()?;

    table.remove(&keys[0])?;
    table.verify()?;

    assert_eq!(big, table.get(&keys[1])?);
    assert_eq!(b"small".to_vec(), table.get(&keys[2])?);

    table.remove(&keys[1])?;
    table.verify()?;

    assert_eq!(b"small".to_vec(), table.get(&keys[2])?);
    assert_eq!(1, table.size().used_slots);

    Ok(())
}

#[test]
fn table_oversized_value_frees_whole_chain() -> hasharr::Result<()> {
    let mut table = table()?;

    let value = (0..255).collect::<Vec<u8>>();
    table.put("big", &value)?;

    let used = table.size().used_slots;
    assert!(used > 1);
    assert_eq!(value, table.get("big")?);

    table.remove("big")?;
    assert_eq!(0, table.size().used_slots);

    Ok(())
}

#[test]
fn table_truncated_keys_with_same_prefix() -> hasharr::Result<()> {
    let mut table = table()?;

    let a = "shared-prefix-of-keys/aaaa";
    let b = "shared-prefix-of-keys/bbbb";

    table.put(a, "A")?;
    table.put(b, "B")?;

    assert_eq!(b"A".to_vec(), table.get(a)?);
    assert_eq!(b"B".to_vec(), table.get(b)?);

    table.remove(a)?;
    assert!(matches!(table.get(a), Err(Error::NotFound)));
    assert_eq!(b"B".to_vec(), table.get(b)?);

    let entry = table.iter().next().expect("should have entry")?;
    assert!(entry.is_truncated());
    assert_eq!(b.len(), entry.key_len);
    assert_eq!(&b.as_bytes()[..hasharr::KEY_CAPACITY], &*entry.key);

    Ok(())
}
