//! UID declarations

/// Transfer Syntax: Implicit VR Little Endian: Default Transfer Syntax for DICOM
#[rustfmt::skip]
pub const IMPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2";
/// Transfer Syntax: Explicit VR Little Endian
#[rustfmt::skip]
pub const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
/// Transfer Syntax: Deflated Explicit VR Little Endian
#[rustfmt::skip]
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1.99";
/// Transfer Syntax: Explicit VR Big Endian (Retired)
#[rustfmt::skip]
pub const EXPLICIT_VR_BIG_ENDIAN: &str = "1.2.840.10008.1.2.2";
/// Transfer Syntax: JPEG Baseline (Process 1)
#[rustfmt::skip]
pub const JPEG_BASELINE8_BIT: &str = "1.2.840.10008.1.2.4.50";
/// Transfer Syntax: JPEG Lossless, Non-Hierarchical, First-Order Prediction
#[rustfmt::skip]
pub const JPEG_LOSSLESS_SV1: &str = "1.2.840.10008.1.2.4.70";
/// Transfer Syntax: JPEG 2000 Image Compression (Lossless Only)
#[rustfmt::skip]
pub const JPEG2000_LOSSLESS: &str = "1.2.840.10008.1.2.4.90";
/// Transfer Syntax: RLE Lossless
#[rustfmt::skip]
pub const RLE_LOSSLESS: &str = "1.2.840.10008.1.2.5";
/// Application Context Name: DICOM Application Context
#[rustfmt::skip]
pub const DICOM_APPLICATION_CONTEXT: &str = "1.2.840.10008.3.1.1.1";
/// SOP Class: Verification SOP Class
#[rustfmt::skip]
pub const VERIFICATION: &str = "1.2.840.10008.1.1";
/// SOP Class: Computed Radiography Image Storage
#[rustfmt::skip]
pub const COMPUTED_RADIOGRAPHY_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.1";
/// SOP Class: Digital X-Ray Image Storage - For Presentation
#[rustfmt::skip]
pub const DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION: &str = "1.2.840.10008.5.1.4.1.1.1.1";
/// SOP Class: CT Image Storage
#[rustfmt::skip]
pub const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
/// SOP Class: Enhanced CT Image Storage
#[rustfmt::skip]
pub const ENHANCED_CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2.1";
/// SOP Class: Ultrasound Multi-frame Image Storage
#[rustfmt::skip]
pub const ULTRASOUND_MULTI_FRAME_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.3.1";
/// SOP Class: MR Image Storage
#[rustfmt::skip]
pub const MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4";
/// SOP Class: Enhanced MR Image Storage
#[rustfmt::skip]
pub const ENHANCED_MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4.1";
/// SOP Class: Ultrasound Image Storage
#[rustfmt::skip]
pub const ULTRASOUND_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.6.1";
/// SOP Class: Secondary Capture Image Storage
#[rustfmt::skip]
pub const SECONDARY_CAPTURE_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.7";
/// SOP Class: X-Ray Angiographic Image Storage
#[rustfmt::skip]
pub const X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.12.1";
/// SOP Class: Nuclear Medicine Image Storage
#[rustfmt::skip]
pub const NUCLEAR_MEDICINE_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.20";
/// SOP Class: Basic Text SR Storage
#[rustfmt::skip]
pub const BASIC_TEXT_SR_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.88.11";
/// SOP Class: Enhanced SR Storage
#[rustfmt::skip]
pub const ENHANCED_SR_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.88.22";
/// SOP Class: Comprehensive SR Storage
#[rustfmt::skip]
pub const COMPREHENSIVE_SR_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.88.33";
/// SOP Class: Encapsulated PDF Storage
#[rustfmt::skip]
pub const ENCAPSULATED_PDF_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.104.1";
/// SOP Class: Positron Emission Tomography Image Storage
#[rustfmt::skip]
pub const POSITRON_EMISSION_TOMOGRAPHY_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.128";
/// SOP Class: RT Image Storage
#[rustfmt::skip]
pub const RT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.1";
/// SOP Class: RT Dose Storage
#[rustfmt::skip]
pub const RT_DOSE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.2";
/// SOP Class: RT Structure Set Storage
#[rustfmt::skip]
pub const RT_STRUCTURE_SET_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.3";
/// SOP Class: RT Plan Storage
#[rustfmt::skip]
pub const RT_PLAN_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.5";
/// SOP Class: Patient Root Query/Retrieve Information Model - FIND
#[rustfmt::skip]
pub const PATIENT_ROOT_QUERY_RETRIEVE_INFORMATION_MODEL_FIND: &str = "1.2.840.10008.5.1.4.1.2.1.1";
/// SOP Class: Patient Root Query/Retrieve Information Model - MOVE
#[rustfmt::skip]
pub const PATIENT_ROOT_QUERY_RETRIEVE_INFORMATION_MODEL_MOVE: &str = "1.2.840.10008.5.1.4.1.2.1.2";
/// SOP Class: Patient Root Query/Retrieve Information Model - GET
#[rustfmt::skip]
pub const PATIENT_ROOT_QUERY_RETRIEVE_INFORMATION_MODEL_GET: &str = "1.2.840.10008.5.1.4.1.2.1.3";
/// SOP Class: Study Root Query/Retrieve Information Model - FIND
#[rustfmt::skip]
pub const STUDY_ROOT_QUERY_RETRIEVE_INFORMATION_MODEL_FIND: &str = "1.2.840.10008.5.1.4.1.2.2.1";
/// SOP Class: Study Root Query/Retrieve Information Model - MOVE
#[rustfmt::skip]
pub const STUDY_ROOT_QUERY_RETRIEVE_INFORMATION_MODEL_MOVE: &str = "1.2.840.10008.5.1.4.1.2.2.2";
/// SOP Class: Study Root Query/Retrieve Information Model - GET
#[rustfmt::skip]
pub const STUDY_ROOT_QUERY_RETRIEVE_INFORMATION_MODEL_GET: &str = "1.2.840.10008.5.1.4.1.2.2.3";

/// The storage SOP classes which a storage service provider
/// in this crate family accepts by default.
pub const STORAGE_SOP_CLASSES: &[&str] = &[
    COMPUTED_RADIOGRAPHY_IMAGE_STORAGE,
    DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION,
    CT_IMAGE_STORAGE,
    ENHANCED_CT_IMAGE_STORAGE,
    ULTRASOUND_MULTI_FRAME_IMAGE_STORAGE,
    MR_IMAGE_STORAGE,
    ENHANCED_MR_IMAGE_STORAGE,
    ULTRASOUND_IMAGE_STORAGE,
    SECONDARY_CAPTURE_IMAGE_STORAGE,
    X_RAY_ANGIOGRAPHIC_IMAGE_STORAGE,
    NUCLEAR_MEDICINE_IMAGE_STORAGE,
    BASIC_TEXT_SR_STORAGE,
    ENHANCED_SR_STORAGE,
    COMPREHENSIVE_SR_STORAGE,
    ENCAPSULATED_PDF_STORAGE,
    POSITRON_EMISSION_TOMOGRAPHY_IMAGE_STORAGE,
    RT_IMAGE_STORAGE,
    RT_DOSE_STORAGE,
    RT_STRUCTURE_SET_STORAGE,
    RT_PLAN_STORAGE,
];

/// The uncompressed transfer syntaxes which every node
/// in this crate family can encode natively.
pub const NATIVE_TRANSFER_SYNTAXES: &[&str] = &[
    IMPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_BIG_ENDIAN,
];
