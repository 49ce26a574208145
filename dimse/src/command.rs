//! DIMSE command messages.
//!
//! A [`CommandMessage`] holds the kind of command,
//! its request or response header,
//! and any other command elements specific to that kind.
//! The fixed fields of the command set
//! (group length, command field, message identifiers,
//! priority, data set type and status)
//! are synthesized when the message is converted into a data set,
//! so they are never stored twice.
use std::fmt;

use dcmnet_core::{DataElement, VR};
use dcmnet_dictionary_std::tags;
use dcmnet_encoding::transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN;
use dcmnet_object::InMemDicomObject;
use snafu::{OptionExt, ResultExt};
use tracing::warn;

use crate::{
    status::Status, InvalidFieldSnafu, InvalidTextSnafu, MissingFieldSnafu, ReadCommandSnafu,
    Result, UnsupportedCommandSnafu, WriteCommandSnafu,
};

/// The value of _Command Data Set Type_ (0000,0800)
/// meaning that no data set follows the command.
pub const DATA_SET_ABSENT: u16 = 0x0101;

/// The value of _Command Data Set Type_ (0000,0800)
/// written when a data set follows the command.
pub const DATA_SET_PRESENT: u16 = 0x0000;

/// The kind of a DIMSE command, as in _Command Field_ (0000,0100).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandField {
    CStoreRq,
    CStoreRsp,
    CGetRq,
    CGetRsp,
    CFindRq,
    CFindRsp,
    CMoveRq,
    CMoveRsp,
    CCancelRq,
}

impl CommandField {
    /// Map a command field code to its command kind.
    ///
    /// Unknown codes are a protocol fault
    /// and result in [`UnsupportedCommand`](crate::Error::UnsupportedCommand).
    pub fn from_code(code: u16) -> Result<Self> {
        Ok(match code {
            0x0001 => CommandField::CStoreRq,
            0x8001 => CommandField::CStoreRsp,
            0x0010 => CommandField::CGetRq,
            0x8010 => CommandField::CGetRsp,
            0x0020 => CommandField::CFindRq,
            0x8020 => CommandField::CFindRsp,
            0x0021 => CommandField::CMoveRq,
            0x8021 => CommandField::CMoveRsp,
            0x0FFF => CommandField::CCancelRq,
            code => return UnsupportedCommandSnafu { code }.fail(),
        })
    }

    pub fn code(self) -> u16 {
        match self {
            CommandField::CStoreRq => 0x0001,
            CommandField::CStoreRsp => 0x8001,
            CommandField::CGetRq => 0x0010,
            CommandField::CGetRsp => 0x8010,
            CommandField::CFindRq => 0x0020,
            CommandField::CFindRsp => 0x8020,
            CommandField::CMoveRq => 0x0021,
            CommandField::CMoveRsp => 0x8021,
            CommandField::CCancelRq => 0x0FFF,
        }
    }

    pub fn is_request(self) -> bool {
        !self.is_response()
    }

    pub fn is_response(self) -> bool {
        self.code() & 0x8000 != 0
    }

    /// The response kind matching this request kind.
    pub fn response(self) -> Option<CommandField> {
        match self {
            CommandField::CStoreRq => Some(CommandField::CStoreRsp),
            CommandField::CGetRq => Some(CommandField::CGetRsp),
            CommandField::CFindRq => Some(CommandField::CFindRsp),
            CommandField::CMoveRq => Some(CommandField::CMoveRsp),
            _ => None,
        }
    }
}

impl fmt::Display for CommandField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandField::CStoreRq => "C-STORE-RQ",
            CommandField::CStoreRsp => "C-STORE-RSP",
            CommandField::CGetRq => "C-GET-RQ",
            CommandField::CGetRsp => "C-GET-RSP",
            CommandField::CFindRq => "C-FIND-RQ",
            CommandField::CFindRsp => "C-FIND-RSP",
            CommandField::CMoveRq => "C-MOVE-RQ",
            CommandField::CMoveRsp => "C-MOVE-RSP",
            CommandField::CCancelRq => "C-CANCEL-RQ",
        })
    }
}

/// The priority of a DIMSE request.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Priority {
    Low = 2,
    #[default]
    Medium = 0,
    High = 1,
}

impl Priority {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Priority::Medium),
            1 => Some(Priority::High),
            2 => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }
}

/// The fixed fields which depend on
/// whether the command is a request or a response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandHeader {
    Request {
        message_id: u16,
        priority: Priority,
    },
    Response {
        message_id_being_responded_to: u16,
        status: Status,
    },
    /// The header of a C-CANCEL-RQ,
    /// which refers to the request to cancel and has no priority
    Cancel { message_id_being_responded_to: u16 },
}

/// Counters of the sub-operations of a C-GET or C-MOVE operation,
/// as reported in their responses.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubOperations {
    pub remaining: Option<u16>,
    pub completed: Option<u16>,
    pub failed: Option<u16>,
    pub warning: Option<u16>,
}

/// A DIMSE command message.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMessage {
    kind: CommandField,
    header: CommandHeader,
    affected_sop_class_uid: Option<String>,
    data_set_present: bool,
    /// the remaining elements specific to the command kind
    elements: InMemDicomObject,
}

impl CommandMessage {
    /// Create a command message from its fixed parts,
    /// without any kind specific elements.
    pub fn new(
        kind: CommandField,
        header: CommandHeader,
        affected_sop_class_uid: Option<String>,
        data_set_present: bool,
    ) -> Self {
        CommandMessage {
            kind,
            header,
            affected_sop_class_uid,
            data_set_present,
            elements: InMemDicomObject::new_empty(),
        }
    }

    /// Create a C-STORE request for the given instance.
    pub fn c_store_rq(
        message_id: u16,
        priority: Priority,
        sop_class_uid: impl Into<String>,
        sop_instance_uid: &str,
    ) -> Self {
        let mut cmd = Self::new(
            CommandField::CStoreRq,
            CommandHeader::Request {
                message_id,
                priority,
            },
            Some(sop_class_uid.into()),
            true,
        );
        cmd.elements
            .put_str(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, sop_instance_uid);
        cmd
    }

    /// Create a C-STORE response for the given instance.
    pub fn c_store_rsp(
        message_id_being_responded_to: u16,
        sop_class_uid: impl Into<String>,
        sop_instance_uid: &str,
        status: Status,
    ) -> Self {
        let mut cmd = Self::new(
            CommandField::CStoreRsp,
            CommandHeader::Response {
                message_id_being_responded_to,
                status,
            },
            Some(sop_class_uid.into()),
            false,
        );
        cmd.elements
            .put_str(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, sop_instance_uid);
        cmd
    }

    /// Create a C-FIND request.
    /// The query identifier is the data set which follows.
    pub fn c_find_rq(message_id: u16, priority: Priority, sop_class_uid: impl Into<String>) -> Self {
        Self::new(
            CommandField::CFindRq,
            CommandHeader::Request {
                message_id,
                priority,
            },
            Some(sop_class_uid.into()),
            true,
        )
    }

    /// Create a C-FIND response.
    /// Pending responses are followed by a matching identifier.
    pub fn c_find_rsp(
        message_id_being_responded_to: u16,
        sop_class_uid: impl Into<String>,
        status: Status,
    ) -> Self {
        Self::new(
            CommandField::CFindRsp,
            CommandHeader::Response {
                message_id_being_responded_to,
                status,
            },
            Some(sop_class_uid.into()),
            status.is_pending(),
        )
    }

    /// Create a C-GET request.
    pub fn c_get_rq(message_id: u16, priority: Priority, sop_class_uid: impl Into<String>) -> Self {
        Self::new(
            CommandField::CGetRq,
            CommandHeader::Request {
                message_id,
                priority,
            },
            Some(sop_class_uid.into()),
            true,
        )
    }

    /// Create a C-GET response.
    pub fn c_get_rsp(
        message_id_being_responded_to: u16,
        sop_class_uid: impl Into<String>,
        status: Status,
    ) -> Self {
        Self::new(
            CommandField::CGetRsp,
            CommandHeader::Response {
                message_id_being_responded_to,
                status,
            },
            Some(sop_class_uid.into()),
            false,
        )
    }

    /// Create a C-MOVE request towards the given destination AE title.
    pub fn c_move_rq(
        message_id: u16,
        priority: Priority,
        sop_class_uid: impl Into<String>,
        move_destination: &str,
    ) -> Self {
        let mut cmd = Self::new(
            CommandField::CMoveRq,
            CommandHeader::Request {
                message_id,
                priority,
            },
            Some(sop_class_uid.into()),
            true,
        );
        cmd.elements
            .put_str(tags::MOVE_DESTINATION, VR::AE, move_destination);
        cmd
    }

    /// Create a C-MOVE response.
    pub fn c_move_rsp(
        message_id_being_responded_to: u16,
        sop_class_uid: impl Into<String>,
        status: Status,
    ) -> Self {
        Self::new(
            CommandField::CMoveRsp,
            CommandHeader::Response {
                message_id_being_responded_to,
                status,
            },
            Some(sop_class_uid.into()),
            false,
        )
    }

    /// Create a C-CANCEL request for the operation
    /// started by the request with the given message ID.
    pub fn c_cancel_rq(message_id_being_responded_to: u16) -> Self {
        Self::new(
            CommandField::CCancelRq,
            CommandHeader::Cancel {
                message_id_being_responded_to,
            },
            None,
            false,
        )
    }

    /// Override whether a data set follows this command.
    pub fn with_data_set_present(mut self, present: bool) -> Self {
        self.data_set_present = present;
        self
    }

    /// Record the sub-operation counters of a C-GET or C-MOVE response.
    pub fn with_sub_operations(mut self, sub_operations: SubOperations) -> Self {
        let counters = [
            (tags::NUMBER_OF_REMAINING_SUBOPERATIONS, sub_operations.remaining),
            (tags::NUMBER_OF_COMPLETED_SUBOPERATIONS, sub_operations.completed),
            (tags::NUMBER_OF_FAILED_SUBOPERATIONS, sub_operations.failed),
            (tags::NUMBER_OF_WARNING_SUBOPERATIONS, sub_operations.warning),
        ];
        for (tag, counter) in counters {
            match counter {
                Some(n) => {
                    self.elements.put_u16(tag, VR::US, n);
                }
                None => {
                    self.elements.remove_element(tag);
                }
            }
        }
        self
    }

    /// Record the C-MOVE operation which triggered this C-STORE request.
    pub fn with_move_originator(mut self, ae_title: &str, message_id: u16) -> Self {
        self.elements
            .put_str(tags::MOVE_ORIGINATOR_APPLICATION_ENTITY_TITLE, VR::AE, ae_title);
        self.elements
            .put_u16(tags::MOVE_ORIGINATOR_MESSAGE_ID, VR::US, message_id);
        self
    }

    /// Insert any other command element.
    pub fn put(&mut self, element: DataElement<InMemDicomObject>) {
        self.elements.put(element);
    }

    pub fn kind(&self) -> CommandField {
        self.kind
    }

    pub fn header(&self) -> &CommandHeader {
        &self.header
    }

    pub fn affected_sop_class_uid(&self) -> Option<&str> {
        self.affected_sop_class_uid.as_deref()
    }

    pub fn data_set_present(&self) -> bool {
        self.data_set_present
    }

    /// The message ID of a request.
    pub fn message_id(&self) -> Option<u16> {
        match self.header {
            CommandHeader::Request { message_id, .. } => Some(message_id),
            _ => None,
        }
    }

    /// The message ID of the request which this message refers to.
    pub fn message_id_being_responded_to(&self) -> Option<u16> {
        match self.header {
            CommandHeader::Response {
                message_id_being_responded_to,
                ..
            }
            | CommandHeader::Cancel {
                message_id_being_responded_to,
            } => Some(message_id_being_responded_to),
            CommandHeader::Request { .. } => None,
        }
    }

    pub fn priority(&self) -> Option<Priority> {
        match self.header {
            CommandHeader::Request { priority, .. } => Some(priority),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<Status> {
        match self.header {
            CommandHeader::Response { status, .. } => Some(status),
            _ => None,
        }
    }

    pub fn affected_sop_instance_uid(&self) -> Option<String> {
        self.text_element(tags::AFFECTED_SOP_INSTANCE_UID)
    }

    pub fn move_destination(&self) -> Option<String> {
        self.text_element(tags::MOVE_DESTINATION)
    }

    pub fn move_originator_ae_title(&self) -> Option<String> {
        self.text_element(tags::MOVE_ORIGINATOR_APPLICATION_ENTITY_TITLE)
    }

    pub fn move_originator_message_id(&self) -> Option<u16> {
        self.u16_element(tags::MOVE_ORIGINATOR_MESSAGE_ID)
    }

    pub fn sub_operations(&self) -> SubOperations {
        SubOperations {
            remaining: self.u16_element(tags::NUMBER_OF_REMAINING_SUBOPERATIONS),
            completed: self.u16_element(tags::NUMBER_OF_COMPLETED_SUBOPERATIONS),
            failed: self.u16_element(tags::NUMBER_OF_FAILED_SUBOPERATIONS),
            warning: self.u16_element(tags::NUMBER_OF_WARNING_SUBOPERATIONS),
        }
    }

    /// The kind specific elements of the command.
    pub fn elements(&self) -> &InMemDicomObject {
        &self.elements
    }

    fn text_element(&self, tag: dcmnet_core::Tag) -> Option<String> {
        self.elements
            .element_opt(tag)
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim_end_matches(['\0', ' ']).to_string())
    }

    fn u16_element(&self, tag: dcmnet_core::Tag) -> Option<u16> {
        self.elements
            .element_opt(tag)
            .and_then(|e| e.to_int::<u16>().ok())
    }

    /// Build the full command set of this message,
    /// including the command group length.
    ///
    /// The group length is the encoded length
    /// of every other element in Implicit VR Little Endian.
    pub fn to_object(&self) -> Result<InMemDicomObject> {
        let mut obj = self.elements.clone();

        if let Some(uid) = &self.affected_sop_class_uid {
            obj.put_str(tags::AFFECTED_SOP_CLASS_UID, VR::UI, uid);
        }
        obj.put_u16(tags::COMMAND_FIELD, VR::US, self.kind.code());
        match self.header {
            CommandHeader::Request {
                message_id,
                priority,
            } => {
                obj.put_u16(tags::MESSAGE_ID, VR::US, message_id);
                obj.put_u16(tags::PRIORITY, VR::US, priority.code());
            }
            CommandHeader::Response {
                message_id_being_responded_to,
                status,
            } => {
                obj.put_u16(
                    tags::MESSAGE_ID_BEING_RESPONDED_TO,
                    VR::US,
                    message_id_being_responded_to,
                );
                obj.put_u16(tags::STATUS, VR::US, status.code());
            }
            CommandHeader::Cancel {
                message_id_being_responded_to,
            } => {
                obj.put_u16(
                    tags::MESSAGE_ID_BEING_RESPONDED_TO,
                    VR::US,
                    message_id_being_responded_to,
                );
            }
        }
        obj.put_u16(
            tags::COMMAND_DATA_SET_TYPE,
            VR::US,
            if self.data_set_present {
                DATA_SET_PRESENT
            } else {
                DATA_SET_ABSENT
            },
        );

        // measured last, placed first
        obj.remove_element(tags::COMMAND_GROUP_LENGTH);
        let group_length = obj
            .encoded_len_with_ts(&IMPLICIT_VR_LITTLE_ENDIAN)
            .context(WriteCommandSnafu)?;
        obj.put_u32(tags::COMMAND_GROUP_LENGTH, VR::UL, group_length as u32);
        Ok(obj)
    }

    /// Encode the command set, always in Implicit VR Little Endian.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let obj = self.to_object()?;
        let mut out = Vec::with_capacity(128);
        obj.write_dataset_with_ts(&mut out, &IMPLICIT_VR_LITTLE_ENDIAN)
            .context(WriteCommandSnafu)?;
        Ok(out)
    }

    /// Decode a command set in Implicit VR Little Endian,
    /// selecting the kind of command from its command field.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let obj = InMemDicomObject::read_dataset_with_ts(bytes, &IMPLICIT_VR_LITTLE_ENDIAN)
            .context(ReadCommandSnafu)?;
        Self::from_object(obj)
    }

    /// Interpret a command set data set as a command message.
    pub fn from_object(mut obj: InMemDicomObject) -> Result<Self> {
        obj.remove_element(tags::COMMAND_GROUP_LENGTH);

        let code = take_u16(&mut obj, tags::COMMAND_FIELD, "CommandField")?
            .context(MissingFieldSnafu {
                name: "CommandField",
            })?;
        let kind = CommandField::from_code(code)?;

        let affected_sop_class_uid = match obj.take_element(tags::AFFECTED_SOP_CLASS_UID) {
            Ok(e) => Some(
                e.to_str()
                    .context(InvalidTextSnafu {
                        name: "AffectedSOPClassUID",
                    })?
                    .trim_end_matches(['\0', ' '])
                    .to_string(),
            ),
            Err(_) => None,
        };

        let data_set_type = take_u16(&mut obj, tags::COMMAND_DATA_SET_TYPE, "CommandDataSetType")?
            .context(MissingFieldSnafu {
                name: "CommandDataSetType",
            })?;

        let header = match kind {
            CommandField::CCancelRq => CommandHeader::Cancel {
                message_id_being_responded_to: take_u16(
                    &mut obj,
                    tags::MESSAGE_ID_BEING_RESPONDED_TO,
                    "MessageIDBeingRespondedTo",
                )?
                .context(MissingFieldSnafu {
                    name: "MessageIDBeingRespondedTo",
                })?,
            },
            kind if kind.is_response() => CommandHeader::Response {
                message_id_being_responded_to: take_u16(
                    &mut obj,
                    tags::MESSAGE_ID_BEING_RESPONDED_TO,
                    "MessageIDBeingRespondedTo",
                )?
                .context(MissingFieldSnafu {
                    name: "MessageIDBeingRespondedTo",
                })?,
                status: take_u16(&mut obj, tags::STATUS, "Status")?
                    .context(MissingFieldSnafu { name: "Status" })?
                    .into(),
            },
            _ => {
                let message_id = take_u16(&mut obj, tags::MESSAGE_ID, "MessageID")?
                    .context(MissingFieldSnafu { name: "MessageID" })?;
                let priority = match take_u16(&mut obj, tags::PRIORITY, "Priority")? {
                    Some(code) => Priority::from_code(code).unwrap_or_else(|| {
                        warn!("Unknown priority code {}, assuming medium", code);
                        Priority::Medium
                    }),
                    None => Priority::Medium,
                };
                CommandHeader::Request {
                    message_id,
                    priority,
                }
            }
        };

        Ok(CommandMessage {
            kind,
            header,
            affected_sop_class_uid,
            data_set_present: data_set_type != DATA_SET_ABSENT,
            elements: obj,
        })
    }
}

/// Take out an unsigned 16-bit command field, if present.
fn take_u16(
    obj: &mut InMemDicomObject,
    tag: dcmnet_core::Tag,
    name: &'static str,
) -> Result<Option<u16>> {
    match obj.take_element(tag) {
        Ok(e) => e
            .to_int::<u16>()
            .map(Some)
            .context(InvalidFieldSnafu { name }),
        Err(_) => Ok(None),
    }
}
