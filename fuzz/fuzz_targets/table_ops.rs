#![no_main]
use arbitrary::{Arbitrary, Result, Unstructured};
use hasharr::{Config, Error};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct FuzzyKey(Vec<u8>);

impl<'a> Arbitrary<'a> for FuzzyKey {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self> {
        let id = u8::arbitrary(u)? % 32;
        let long = bool::arbitrary(u)?;

        // Long keys share a prefix, so they are stored truncated
        let key = if long {
            format!("a-long-shared-key-prefix/{id}")
        } else {
            format!("k{id}")
        };

        Ok(Self(key.into_bytes()))
    }
}

#[derive(Arbitrary, Clone, Debug)]
enum Op {
    Put(FuzzyKey, Vec<u8>),
    Remove(FuzzyKey),
    Get(FuzzyKey),
    Clear,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);

    let slots = usize::from(u8::arbitrary(&mut unstructured).unwrap_or(8).max(1));

    let Ok(ops) = <Vec<Op> as Arbitrary>::arbitrary(&mut unstructured) else {
        return;
    };

    let mut table = Config::new(slots).create_in_memory().unwrap();
    let mut model = HashMap::<Vec<u8>, Vec<u8>>::new();

    for op in ops {
        match op {
            Op::Put(FuzzyKey(key), value) => match table.put(&key, &value) {
                Ok(()) => {
                    model.insert(key, value);
                }
                Err(Error::OutOfSpace) => {}
                Err(e) => panic!("put failed: {e:?}"),
            },
            Op::Remove(FuzzyKey(key)) => match table.remove(&key) {
                Ok(()) => assert!(model.remove(&key).is_some()),
                Err(Error::NotFound) => assert!(!model.contains_key(&key)),
                Err(e) => panic!("remove failed: {e:?}"),
            },
            Op::Get(FuzzyKey(key)) => match table.get(&key) {
                Ok(value) => assert_eq!(model.get(&key), Some(&value)),
                Err(Error::NotFound) => assert!(!model.contains_key(&key)),
                Err(e) => panic!("get failed: {e:?}"),
            },
            Op::Clear => {
                table.clear();
                model.clear();
            }
        }

        table.verify().unwrap();
        assert_eq!(model.len(), table.len());
    }

    for (key, value) in &model {
        assert_eq!(*value, table.get(key).unwrap());
    }
});
