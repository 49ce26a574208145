//! Reading and writing DICOM files on disk.
use dcmnet_core::{DataElement, PrimitiveValue, VR};
use dcmnet_dictionary_std::{tags, uids};
use dcmnet_object::{
    meta, open_file, open_meta, open_raw, FileMetaTableBuilder, InMemDicomObject, ReadError,
};
use std::io::Write;

fn write_sample(path: &std::path::Path, ts: &str) {
    let meta = FileMetaTableBuilder::new()
        .transfer_syntax(ts)
        .media_storage_sop_class_uid(uids::CT_IMAGE_STORAGE)
        .media_storage_sop_instance_uid("2.25.314159")
        .source_application_entity_title("STORE-SCU")
        .build()
        .unwrap();

    let mut obj = InMemDicomObject::new_empty();
    obj.put_str(tags::SOP_CLASS_UID, VR::UI, uids::CT_IMAGE_STORAGE);
    obj.put_str(tags::SOP_INSTANCE_UID, VR::UI, "2.25.314159");
    obj.put_str(tags::MODALITY, VR::CS, "CT");
    obj.put(DataElement::new(
        tags::STUDY_DESCRIPTION,
        VR::LO,
        PrimitiveValue::from("Head"),
    ));
    obj.put_u16(tags::ROWS, VR::US, 256);

    obj.with_meta(meta).write_to_file(path).unwrap();
}

#[test]
fn write_and_open_file_in_every_native_syntax() {
    let dir = tempfile::tempdir().unwrap();
    for (i, ts) in uids::NATIVE_TRANSFER_SYNTAXES.iter().enumerate() {
        let path = dir.path().join(format!("{}.dcm", i));
        write_sample(&path, ts);

        let obj = open_file(&path).unwrap();
        assert_eq!(obj.meta().transfer_syntax(), *ts);
        assert_eq!(
            obj.meta().media_storage_sop_class_uid(),
            uids::CT_IMAGE_STORAGE
        );
        assert_eq!(
            obj.element_by_name("Modality").unwrap().to_str().unwrap(),
            "CT"
        );
        assert_eq!(obj.element(tags::ROWS).unwrap().to_int::<u16>().unwrap(), 256);
    }
}

#[test]
fn open_meta_and_raw_agree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.dcm");
    write_sample(&path, uids::EXPLICIT_VR_LITTLE_ENDIAN);

    let meta = open_meta(&path).unwrap();
    let raw = open_raw(&path).unwrap();
    assert_eq!(meta, raw.meta);
    assert_eq!(
        meta.source_application_entity_title.as_deref(),
        Some("STORE-SCU ")
    );

    let file_len = std::fs::metadata(&path).unwrap().len() as usize;
    // preamble + magic + group length element + group
    let header_len = 128 + 4 + 12 + meta.information_group_length as usize;
    assert_eq!(raw.dataset.len(), file_len - header_len);
}

#[test]
fn file_without_magic_code_is_not_dicom() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-dicom.dcm");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&[0u8; 128]).unwrap();
    file.write_all(b"NOPE and some more bytes").unwrap();
    drop(file);

    let err = open_meta(&path).unwrap_err();
    assert!(matches!(
        err,
        ReadError::ParseMetaDataSet {
            source: meta::Error::NotDicom { .. },
            ..
        }
    ));
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_file(dir.path().join("nothing-here.dcm")).unwrap_err();
    assert!(matches!(err, ReadError::OpenFile { .. }));
}
