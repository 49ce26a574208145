//! Data element tag declarations
//!
//! This module contains a tag constant for each attribute
//! in the standard data dictionary.

use dcmnet_core::dictionary::{DictionaryEntryRef, ValueMultiplicity};
use dcmnet_core::header::{Tag, VR};

/// CommandGroupLength (0000,0000) VR UL
#[rustfmt::skip]
pub const COMMAND_GROUP_LENGTH: Tag = Tag(0x0000, 0x0000);
/// AffectedSOPClassUID (0000,0002) VR UI
#[rustfmt::skip]
pub const AFFECTED_SOP_CLASS_UID: Tag = Tag(0x0000, 0x0002);
/// RequestedSOPClassUID (0000,0003) VR UI
#[rustfmt::skip]
pub const REQUESTED_SOP_CLASS_UID: Tag = Tag(0x0000, 0x0003);
/// CommandField (0000,0100) VR US
#[rustfmt::skip]
pub const COMMAND_FIELD: Tag = Tag(0x0000, 0x0100);
/// MessageID (0000,0110) VR US
#[rustfmt::skip]
pub const MESSAGE_ID: Tag = Tag(0x0000, 0x0110);
/// MessageIDBeingRespondedTo (0000,0120) VR US
#[rustfmt::skip]
pub const MESSAGE_ID_BEING_RESPONDED_TO: Tag = Tag(0x0000, 0x0120);
/// MoveDestination (0000,0600) VR AE
#[rustfmt::skip]
pub const MOVE_DESTINATION: Tag = Tag(0x0000, 0x0600);
/// Priority (0000,0700) VR US
#[rustfmt::skip]
pub const PRIORITY: Tag = Tag(0x0000, 0x0700);
/// CommandDataSetType (0000,0800) VR US
#[rustfmt::skip]
pub const COMMAND_DATA_SET_TYPE: Tag = Tag(0x0000, 0x0800);
/// Status (0000,0900) VR US
#[rustfmt::skip]
pub const STATUS: Tag = Tag(0x0000, 0x0900);
/// OffendingElement (0000,0901) VR AT
#[rustfmt::skip]
pub const OFFENDING_ELEMENT: Tag = Tag(0x0000, 0x0901);
/// ErrorComment (0000,0902) VR LO
#[rustfmt::skip]
pub const ERROR_COMMENT: Tag = Tag(0x0000, 0x0902);
/// ErrorID (0000,0903) VR US
#[rustfmt::skip]
pub const ERROR_ID: Tag = Tag(0x0000, 0x0903);
/// AffectedSOPInstanceUID (0000,1000) VR UI
#[rustfmt::skip]
pub const AFFECTED_SOP_INSTANCE_UID: Tag = Tag(0x0000, 0x1000);
/// RequestedSOPInstanceUID (0000,1001) VR UI
#[rustfmt::skip]
pub const REQUESTED_SOP_INSTANCE_UID: Tag = Tag(0x0000, 0x1001);
/// NumberOfRemainingSuboperations (0000,1020) VR US
#[rustfmt::skip]
pub const NUMBER_OF_REMAINING_SUBOPERATIONS: Tag = Tag(0x0000, 0x1020);
/// NumberOfCompletedSuboperations (0000,1021) VR US
#[rustfmt::skip]
pub const NUMBER_OF_COMPLETED_SUBOPERATIONS: Tag = Tag(0x0000, 0x1021);
/// NumberOfFailedSuboperations (0000,1022) VR US
#[rustfmt::skip]
pub const NUMBER_OF_FAILED_SUBOPERATIONS: Tag = Tag(0x0000, 0x1022);
/// NumberOfWarningSuboperations (0000,1023) VR US
#[rustfmt::skip]
pub const NUMBER_OF_WARNING_SUBOPERATIONS: Tag = Tag(0x0000, 0x1023);
/// MoveOriginatorApplicationEntityTitle (0000,1030) VR AE
#[rustfmt::skip]
pub const MOVE_ORIGINATOR_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0000, 0x1030);
/// MoveOriginatorMessageID (0000,1031) VR US
#[rustfmt::skip]
pub const MOVE_ORIGINATOR_MESSAGE_ID: Tag = Tag(0x0000, 0x1031);
/// FileMetaInformationGroupLength (0002,0000) VR UL
#[rustfmt::skip]
pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
/// FileMetaInformationVersion (0002,0001) VR OB
#[rustfmt::skip]
pub const FILE_META_INFORMATION_VERSION: Tag = Tag(0x0002, 0x0001);
/// MediaStorageSOPClassUID (0002,0002) VR UI
#[rustfmt::skip]
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
/// MediaStorageSOPInstanceUID (0002,0003) VR UI
#[rustfmt::skip]
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
/// TransferSyntaxUID (0002,0010) VR UI
#[rustfmt::skip]
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
/// ImplementationClassUID (0002,0012) VR UI
#[rustfmt::skip]
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
/// ImplementationVersionName (0002,0013) VR SH
#[rustfmt::skip]
pub const IMPLEMENTATION_VERSION_NAME: Tag = Tag(0x0002, 0x0013);
/// SourceApplicationEntityTitle (0002,0016) VR AE
#[rustfmt::skip]
pub const SOURCE_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0016);
/// PrivateInformationCreatorUID (0002,0100) VR UI
#[rustfmt::skip]
pub const PRIVATE_INFORMATION_CREATOR_UID: Tag = Tag(0x0002, 0x0100);
/// PrivateInformation (0002,0102) VR OB
#[rustfmt::skip]
pub const PRIVATE_INFORMATION: Tag = Tag(0x0002, 0x0102);
/// SpecificCharacterSet (0008,0005) VR CS
#[rustfmt::skip]
pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
/// ImageType (0008,0008) VR CS
#[rustfmt::skip]
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
/// InstanceCreationDate (0008,0012) VR DA
#[rustfmt::skip]
pub const INSTANCE_CREATION_DATE: Tag = Tag(0x0008, 0x0012);
/// InstanceCreationTime (0008,0013) VR TM
#[rustfmt::skip]
pub const INSTANCE_CREATION_TIME: Tag = Tag(0x0008, 0x0013);
/// SOPClassUID (0008,0016) VR UI
#[rustfmt::skip]
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
/// SOPInstanceUID (0008,0018) VR UI
#[rustfmt::skip]
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
/// StudyDate (0008,0020) VR DA
#[rustfmt::skip]
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
/// SeriesDate (0008,0021) VR DA
#[rustfmt::skip]
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
/// ContentDate (0008,0023) VR DA
#[rustfmt::skip]
pub const CONTENT_DATE: Tag = Tag(0x0008, 0x0023);
/// StudyTime (0008,0030) VR TM
#[rustfmt::skip]
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
/// SeriesTime (0008,0031) VR TM
#[rustfmt::skip]
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
/// ContentTime (0008,0033) VR TM
#[rustfmt::skip]
pub const CONTENT_TIME: Tag = Tag(0x0008, 0x0033);
/// AccessionNumber (0008,0050) VR SH
#[rustfmt::skip]
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
/// QueryRetrieveLevel (0008,0052) VR CS
#[rustfmt::skip]
pub const QUERY_RETRIEVE_LEVEL: Tag = Tag(0x0008, 0x0052);
/// RetrieveAETitle (0008,0054) VR AE
#[rustfmt::skip]
pub const RETRIEVE_AE_TITLE: Tag = Tag(0x0008, 0x0054);
/// Modality (0008,0060) VR CS
#[rustfmt::skip]
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
/// ModalitiesInStudy (0008,0061) VR CS
#[rustfmt::skip]
pub const MODALITIES_IN_STUDY: Tag = Tag(0x0008, 0x0061);
/// ConversionType (0008,0064) VR CS
#[rustfmt::skip]
pub const CONVERSION_TYPE: Tag = Tag(0x0008, 0x0064);
/// Manufacturer (0008,0070) VR LO
#[rustfmt::skip]
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
/// InstitutionName (0008,0080) VR LO
#[rustfmt::skip]
pub const INSTITUTION_NAME: Tag = Tag(0x0008, 0x0080);
/// ReferringPhysicianName (0008,0090) VR PN
#[rustfmt::skip]
pub const REFERRING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x0090);
/// StudyDescription (0008,1030) VR LO
#[rustfmt::skip]
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
/// SeriesDescription (0008,103E) VR LO
#[rustfmt::skip]
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
/// ManufacturerModelName (0008,1090) VR LO
#[rustfmt::skip]
pub const MANUFACTURER_MODEL_NAME: Tag = Tag(0x0008, 0x1090);
/// ReferencedSeriesSequence (0008,1115) VR SQ
#[rustfmt::skip]
pub const REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x0008, 0x1115);
/// ReferencedImageSequence (0008,1140) VR SQ
#[rustfmt::skip]
pub const REFERENCED_IMAGE_SEQUENCE: Tag = Tag(0x0008, 0x1140);
/// ReferencedSOPClassUID (0008,1150) VR UI
#[rustfmt::skip]
pub const REFERENCED_SOP_CLASS_UID: Tag = Tag(0x0008, 0x1150);
/// ReferencedSOPInstanceUID (0008,1155) VR UI
#[rustfmt::skip]
pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x1155);
/// PatientName (0010,0010) VR PN
#[rustfmt::skip]
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
/// PatientID (0010,0020) VR LO
#[rustfmt::skip]
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
/// PatientBirthDate (0010,0030) VR DA
#[rustfmt::skip]
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
/// PatientSex (0010,0040) VR CS
#[rustfmt::skip]
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
/// PatientAge (0010,1010) VR AS
#[rustfmt::skip]
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);
/// PatientSize (0010,1020) VR DS
#[rustfmt::skip]
pub const PATIENT_SIZE: Tag = Tag(0x0010, 0x1020);
/// PatientWeight (0010,1030) VR DS
#[rustfmt::skip]
pub const PATIENT_WEIGHT: Tag = Tag(0x0010, 0x1030);
/// BodyPartExamined (0018,0015) VR CS
#[rustfmt::skip]
pub const BODY_PART_EXAMINED: Tag = Tag(0x0018, 0x0015);
/// SliceThickness (0018,0050) VR DS
#[rustfmt::skip]
pub const SLICE_THICKNESS: Tag = Tag(0x0018, 0x0050);
/// SpacingBetweenSlices (0018,0088) VR DS
#[rustfmt::skip]
pub const SPACING_BETWEEN_SLICES: Tag = Tag(0x0018, 0x0088);
/// SequenceOfUltrasoundRegions (0018,6011) VR SQ
#[rustfmt::skip]
pub const SEQUENCE_OF_ULTRASOUND_REGIONS: Tag = Tag(0x0018, 0x6011);
/// RegionSpatialFormat (0018,6012) VR US
#[rustfmt::skip]
pub const REGION_SPATIAL_FORMAT: Tag = Tag(0x0018, 0x6012);
/// StudyInstanceUID (0020,000D) VR UI
#[rustfmt::skip]
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
/// SeriesInstanceUID (0020,000E) VR UI
#[rustfmt::skip]
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
/// StudyID (0020,0010) VR SH
#[rustfmt::skip]
pub const STUDY_ID: Tag = Tag(0x0020, 0x0010);
/// SeriesNumber (0020,0011) VR IS
#[rustfmt::skip]
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
/// InstanceNumber (0020,0013) VR IS
#[rustfmt::skip]
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
/// ImagePositionPatient (0020,0032) VR DS
#[rustfmt::skip]
pub const IMAGE_POSITION_PATIENT: Tag = Tag(0x0020, 0x0032);
/// FrameOfReferenceUID (0020,0052) VR UI
#[rustfmt::skip]
pub const FRAME_OF_REFERENCE_UID: Tag = Tag(0x0020, 0x0052);
/// NumberOfStudyRelatedInstances (0020,1208) VR IS
#[rustfmt::skip]
pub const NUMBER_OF_STUDY_RELATED_INSTANCES: Tag = Tag(0x0020, 0x1208);
/// ImageComments (0020,4000) VR LT
#[rustfmt::skip]
pub const IMAGE_COMMENTS: Tag = Tag(0x0020, 0x4000);
/// SamplesPerPixel (0028,0002) VR US
#[rustfmt::skip]
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
/// PhotometricInterpretation (0028,0004) VR CS
#[rustfmt::skip]
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
/// NumberOfFrames (0028,0008) VR IS
#[rustfmt::skip]
pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
/// Rows (0028,0010) VR US
#[rustfmt::skip]
pub const ROWS: Tag = Tag(0x0028, 0x0010);
/// Columns (0028,0011) VR US
#[rustfmt::skip]
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
/// PixelSpacing (0028,0030) VR DS
#[rustfmt::skip]
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
/// BitsAllocated (0028,0100) VR US
#[rustfmt::skip]
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
/// BitsStored (0028,0101) VR US
#[rustfmt::skip]
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
/// HighBit (0028,0102) VR US
#[rustfmt::skip]
pub const HIGH_BIT: Tag = Tag(0x0028, 0x0102);
/// PixelRepresentation (0028,0103) VR US
#[rustfmt::skip]
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
/// WindowCenter (0028,1050) VR DS
#[rustfmt::skip]
pub const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
/// WindowWidth (0028,1051) VR DS
#[rustfmt::skip]
pub const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
/// RescaleIntercept (0028,1052) VR DS
#[rustfmt::skip]
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
/// RescaleSlope (0028,1053) VR DS
#[rustfmt::skip]
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);
/// VOILUTSequence (0028,3010) VR SQ
#[rustfmt::skip]
pub const VOILUT_SEQUENCE: Tag = Tag(0x0028, 0x3010);
/// ContentSequence (0040,A730) VR SQ
#[rustfmt::skip]
pub const CONTENT_SEQUENCE: Tag = Tag(0x0040, 0xA730);
/// PixelData (7FE0,0010) VR OW
#[rustfmt::skip]
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
/// Item (FFFE,E000) VR UN
#[rustfmt::skip]
pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
/// ItemDelimitationItem (FFFE,E00D) VR UN
#[rustfmt::skip]
pub const ITEM_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE00D);
/// SequenceDelimitationItem (FFFE,E0DD) VR UN
#[rustfmt::skip]
pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE0DD);

type E = DictionaryEntryRef<'static>;

#[rustfmt::skip]
pub(crate) const ENTRIES: &[E] = &[
    E { tag: COMMAND_GROUP_LENGTH, alias: "CommandGroupLength", vr: VR::UL, vm: ValueMultiplicity::One },
    E { tag: AFFECTED_SOP_CLASS_UID, alias: "AffectedSOPClassUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: REQUESTED_SOP_CLASS_UID, alias: "RequestedSOPClassUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: COMMAND_FIELD, alias: "CommandField", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: MESSAGE_ID, alias: "MessageID", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: MESSAGE_ID_BEING_RESPONDED_TO, alias: "MessageIDBeingRespondedTo", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: MOVE_DESTINATION, alias: "MoveDestination", vr: VR::AE, vm: ValueMultiplicity::One },
    E { tag: PRIORITY, alias: "Priority", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: COMMAND_DATA_SET_TYPE, alias: "CommandDataSetType", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: STATUS, alias: "Status", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: OFFENDING_ELEMENT, alias: "OffendingElement", vr: VR::AT, vm: ValueMultiplicity::Unbounded },
    E { tag: ERROR_COMMENT, alias: "ErrorComment", vr: VR::LO, vm: ValueMultiplicity::One },
    E { tag: ERROR_ID, alias: "ErrorID", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: AFFECTED_SOP_INSTANCE_UID, alias: "AffectedSOPInstanceUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: REQUESTED_SOP_INSTANCE_UID, alias: "RequestedSOPInstanceUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: NUMBER_OF_REMAINING_SUBOPERATIONS, alias: "NumberOfRemainingSuboperations", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: NUMBER_OF_COMPLETED_SUBOPERATIONS, alias: "NumberOfCompletedSuboperations", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: NUMBER_OF_FAILED_SUBOPERATIONS, alias: "NumberOfFailedSuboperations", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: NUMBER_OF_WARNING_SUBOPERATIONS, alias: "NumberOfWarningSuboperations", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: MOVE_ORIGINATOR_APPLICATION_ENTITY_TITLE, alias: "MoveOriginatorApplicationEntityTitle", vr: VR::AE, vm: ValueMultiplicity::One },
    E { tag: MOVE_ORIGINATOR_MESSAGE_ID, alias: "MoveOriginatorMessageID", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: FILE_META_INFORMATION_GROUP_LENGTH, alias: "FileMetaInformationGroupLength", vr: VR::UL, vm: ValueMultiplicity::One },
    E { tag: FILE_META_INFORMATION_VERSION, alias: "FileMetaInformationVersion", vr: VR::OB, vm: ValueMultiplicity::One },
    E { tag: MEDIA_STORAGE_SOP_CLASS_UID, alias: "MediaStorageSOPClassUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: MEDIA_STORAGE_SOP_INSTANCE_UID, alias: "MediaStorageSOPInstanceUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: TRANSFER_SYNTAX_UID, alias: "TransferSyntaxUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: IMPLEMENTATION_CLASS_UID, alias: "ImplementationClassUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: IMPLEMENTATION_VERSION_NAME, alias: "ImplementationVersionName", vr: VR::SH, vm: ValueMultiplicity::One },
    E { tag: SOURCE_APPLICATION_ENTITY_TITLE, alias: "SourceApplicationEntityTitle", vr: VR::AE, vm: ValueMultiplicity::One },
    E { tag: PRIVATE_INFORMATION_CREATOR_UID, alias: "PrivateInformationCreatorUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: PRIVATE_INFORMATION, alias: "PrivateInformation", vr: VR::OB, vm: ValueMultiplicity::One },
    E { tag: SPECIFIC_CHARACTER_SET, alias: "SpecificCharacterSet", vr: VR::CS, vm: ValueMultiplicity::Unbounded },
    E { tag: IMAGE_TYPE, alias: "ImageType", vr: VR::CS, vm: ValueMultiplicity::Unbounded },
    E { tag: INSTANCE_CREATION_DATE, alias: "InstanceCreationDate", vr: VR::DA, vm: ValueMultiplicity::One },
    E { tag: INSTANCE_CREATION_TIME, alias: "InstanceCreationTime", vr: VR::TM, vm: ValueMultiplicity::One },
    E { tag: SOP_CLASS_UID, alias: "SOPClassUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: SOP_INSTANCE_UID, alias: "SOPInstanceUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: STUDY_DATE, alias: "StudyDate", vr: VR::DA, vm: ValueMultiplicity::One },
    E { tag: SERIES_DATE, alias: "SeriesDate", vr: VR::DA, vm: ValueMultiplicity::One },
    E { tag: CONTENT_DATE, alias: "ContentDate", vr: VR::DA, vm: ValueMultiplicity::One },
    E { tag: STUDY_TIME, alias: "StudyTime", vr: VR::TM, vm: ValueMultiplicity::One },
    E { tag: SERIES_TIME, alias: "SeriesTime", vr: VR::TM, vm: ValueMultiplicity::One },
    E { tag: CONTENT_TIME, alias: "ContentTime", vr: VR::TM, vm: ValueMultiplicity::One },
    E { tag: ACCESSION_NUMBER, alias: "AccessionNumber", vr: VR::SH, vm: ValueMultiplicity::One },
    E { tag: QUERY_RETRIEVE_LEVEL, alias: "QueryRetrieveLevel", vr: VR::CS, vm: ValueMultiplicity::One },
    E { tag: RETRIEVE_AE_TITLE, alias: "RetrieveAETitle", vr: VR::AE, vm: ValueMultiplicity::Unbounded },
    E { tag: MODALITY, alias: "Modality", vr: VR::CS, vm: ValueMultiplicity::One },
    E { tag: MODALITIES_IN_STUDY, alias: "ModalitiesInStudy", vr: VR::CS, vm: ValueMultiplicity::Unbounded },
    E { tag: CONVERSION_TYPE, alias: "ConversionType", vr: VR::CS, vm: ValueMultiplicity::One },
    E { tag: MANUFACTURER, alias: "Manufacturer", vr: VR::LO, vm: ValueMultiplicity::One },
    E { tag: INSTITUTION_NAME, alias: "InstitutionName", vr: VR::LO, vm: ValueMultiplicity::One },
    E { tag: REFERRING_PHYSICIAN_NAME, alias: "ReferringPhysicianName", vr: VR::PN, vm: ValueMultiplicity::One },
    E { tag: STUDY_DESCRIPTION, alias: "StudyDescription", vr: VR::LO, vm: ValueMultiplicity::One },
    E { tag: SERIES_DESCRIPTION, alias: "SeriesDescription", vr: VR::LO, vm: ValueMultiplicity::One },
    E { tag: MANUFACTURER_MODEL_NAME, alias: "ManufacturerModelName", vr: VR::LO, vm: ValueMultiplicity::One },
    E { tag: REFERENCED_SERIES_SEQUENCE, alias: "ReferencedSeriesSequence", vr: VR::SQ, vm: ValueMultiplicity::One },
    E { tag: REFERENCED_IMAGE_SEQUENCE, alias: "ReferencedImageSequence", vr: VR::SQ, vm: ValueMultiplicity::One },
    E { tag: REFERENCED_SOP_CLASS_UID, alias: "ReferencedSOPClassUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: REFERENCED_SOP_INSTANCE_UID, alias: "ReferencedSOPInstanceUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: PATIENT_NAME, alias: "PatientName", vr: VR::PN, vm: ValueMultiplicity::One },
    E { tag: PATIENT_ID, alias: "PatientID", vr: VR::LO, vm: ValueMultiplicity::One },
    E { tag: PATIENT_BIRTH_DATE, alias: "PatientBirthDate", vr: VR::DA, vm: ValueMultiplicity::One },
    E { tag: PATIENT_SEX, alias: "PatientSex", vr: VR::CS, vm: ValueMultiplicity::One },
    E { tag: PATIENT_AGE, alias: "PatientAge", vr: VR::AS, vm: ValueMultiplicity::One },
    E { tag: PATIENT_SIZE, alias: "PatientSize", vr: VR::DS, vm: ValueMultiplicity::One },
    E { tag: PATIENT_WEIGHT, alias: "PatientWeight", vr: VR::DS, vm: ValueMultiplicity::One },
    E { tag: BODY_PART_EXAMINED, alias: "BodyPartExamined", vr: VR::CS, vm: ValueMultiplicity::One },
    E { tag: SLICE_THICKNESS, alias: "SliceThickness", vr: VR::DS, vm: ValueMultiplicity::One },
    E { tag: SPACING_BETWEEN_SLICES, alias: "SpacingBetweenSlices", vr: VR::DS, vm: ValueMultiplicity::One },
    E { tag: SEQUENCE_OF_ULTRASOUND_REGIONS, alias: "SequenceOfUltrasoundRegions", vr: VR::SQ, vm: ValueMultiplicity::One },
    E { tag: REGION_SPATIAL_FORMAT, alias: "RegionSpatialFormat", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: STUDY_INSTANCE_UID, alias: "StudyInstanceUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: SERIES_INSTANCE_UID, alias: "SeriesInstanceUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: STUDY_ID, alias: "StudyID", vr: VR::SH, vm: ValueMultiplicity::One },
    E { tag: SERIES_NUMBER, alias: "SeriesNumber", vr: VR::IS, vm: ValueMultiplicity::One },
    E { tag: INSTANCE_NUMBER, alias: "InstanceNumber", vr: VR::IS, vm: ValueMultiplicity::One },
    E { tag: IMAGE_POSITION_PATIENT, alias: "ImagePositionPatient", vr: VR::DS, vm: ValueMultiplicity::Three },
    E { tag: FRAME_OF_REFERENCE_UID, alias: "FrameOfReferenceUID", vr: VR::UI, vm: ValueMultiplicity::One },
    E { tag: NUMBER_OF_STUDY_RELATED_INSTANCES, alias: "NumberOfStudyRelatedInstances", vr: VR::IS, vm: ValueMultiplicity::One },
    E { tag: IMAGE_COMMENTS, alias: "ImageComments", vr: VR::LT, vm: ValueMultiplicity::One },
    E { tag: SAMPLES_PER_PIXEL, alias: "SamplesPerPixel", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: PHOTOMETRIC_INTERPRETATION, alias: "PhotometricInterpretation", vr: VR::CS, vm: ValueMultiplicity::One },
    E { tag: NUMBER_OF_FRAMES, alias: "NumberOfFrames", vr: VR::IS, vm: ValueMultiplicity::One },
    E { tag: ROWS, alias: "Rows", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: COLUMNS, alias: "Columns", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: PIXEL_SPACING, alias: "PixelSpacing", vr: VR::DS, vm: ValueMultiplicity::Two },
    E { tag: BITS_ALLOCATED, alias: "BitsAllocated", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: BITS_STORED, alias: "BitsStored", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: HIGH_BIT, alias: "HighBit", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: PIXEL_REPRESENTATION, alias: "PixelRepresentation", vr: VR::US, vm: ValueMultiplicity::One },
    E { tag: WINDOW_CENTER, alias: "WindowCenter", vr: VR::DS, vm: ValueMultiplicity::Unbounded },
    E { tag: WINDOW_WIDTH, alias: "WindowWidth", vr: VR::DS, vm: ValueMultiplicity::Unbounded },
    E { tag: RESCALE_INTERCEPT, alias: "RescaleIntercept", vr: VR::DS, vm: ValueMultiplicity::One },
    E { tag: RESCALE_SLOPE, alias: "RescaleSlope", vr: VR::DS, vm: ValueMultiplicity::One },
    E { tag: VOILUT_SEQUENCE, alias: "VOILUTSequence", vr: VR::SQ, vm: ValueMultiplicity::One },
    E { tag: CONTENT_SEQUENCE, alias: "ContentSequence", vr: VR::SQ, vm: ValueMultiplicity::One },
    E { tag: PIXEL_DATA, alias: "PixelData", vr: VR::OW, vm: ValueMultiplicity::One },
    E { tag: ITEM, alias: "Item", vr: VR::UN, vm: ValueMultiplicity::One },
    E { tag: ITEM_DELIMITATION_ITEM, alias: "ItemDelimitationItem", vr: VR::UN, vm: ValueMultiplicity::One },
    E { tag: SEQUENCE_DELIMITATION_ITEM, alias: "SequenceDelimitationItem", vr: VR::UN, vm: ValueMultiplicity::One },
];
