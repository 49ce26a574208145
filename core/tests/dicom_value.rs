//! Separate test suite for using `dicom_value!` in an isolated context,
//! without direct access to dependency `smallvec`

// empty module makes `smallvec` dependency unreachable,
// as would be typical in dependents of `dcmnet_core`
// unless they include it themselves
mod smallvec {}

#[test]
fn use_dicom_value() {
    use dcmnet_core::dicom_value;

    // multiple string literals with variant, no trailing comma
    let value = dicom_value!(Strs, ["BASE", "LIGHT", "DARK"]);
    assert_eq!(
        value.strings().unwrap(),
        &["BASE".to_owned(), "LIGHT".to_owned(), "DARK".to_owned()],
    );

    // single string with variant
    let value = dicom_value!(Str, "PALETTE COLOR ");
    assert_eq!(value.to_str(), "PALETTE COLOR");

    // numeric values
    let value = dicom_value!(U16, [1, 2, 5]);
    assert_eq!(value.multiplicity(), 3);
    assert_eq!(value.to_int::<u16>().unwrap(), 1);

    // single numeric value
    let value = dicom_value!(U32, 0x0101);
    assert_eq!(value.uint32().unwrap(), 0x0101);

    // empty
    let value = dicom_value!();
    assert_eq!(value.multiplicity(), 0);
}
