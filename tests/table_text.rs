use hasharr::{Config, DecodeError, Error};
use test_log::test;

#[test]
fn table_text_values() -> hasharr::Result<()> {
    let mut table = Config::new(20).create_in_memory()?;

    table.put_str("name", "hasharr")?;
    table.put_int("answer", 42)?;
    table.put_int("negative", -7)?;
    table.put_fmt("formatted", format_args!("{}-{}", "a", 1))?;

    assert_eq!("hasharr", table.get_str("name")?);
    assert_eq!(42, table.get_int("answer")?);
    assert_eq!(-7, table.get_int("negative")?);
    assert_eq!("a-1", table.get_str("formatted")?);

    // Strings are stored with their terminating NUL
    assert_eq!(b"hasharr\0".to_vec(), table.get("name")?);
    assert_eq!("42", table.get_str("answer")?);

    Ok(())
}

#[test]
fn table_text_long_string() -> hasharr::Result<()> {
    let mut table = Config::new(20).create_in_memory()?;

    let value = "lorem ipsum ".repeat(30);
    table.put_str("long", &value)?;

    assert_eq!(value, table.get_str("long")?);

    Ok(())
}

#[test]
fn table_text_decode_errors() -> hasharr::Result<()> {
    let mut table = Config::new(20).create_in_memory()?;

    table.put_str("word", "not a number")?;
    table.put("binary", [0xff, 0xfe, 0x00])?;

    assert!(matches!(
        table.get_int("word"),
        Err(Error::Decode(DecodeError::InvalidInteger(_)))
    ));
    assert!(matches!(
        table.get_str("binary"),
        Err(Error::Decode(DecodeError::Utf8(_)))
    ));
    assert!(matches!(table.get_str("missing"), Err(Error::NotFound)));

    Ok(())
}
