//! Entity payloads relayed to the destination.
//!
//! # Responsibility
//! - Define one fixed field set per built-in entity type.
//! - Map each field set onto its destination command and parameters.
//!
//! # Invariants
//! - Field values are validated by the caller before delivery.
//! - `wserver_id` in wire params is always the source record id.

use crate::model::report::SourceRecordId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Debug;

/// Entity type name for waste categories.
pub const ENTITY_TRASH_CATS: &str = "trash_cats";
/// Entity type name for waste types.
pub const ENTITY_TRASH_TYPES: &str = "trash_types";
/// Entity type name for carrier companies.
pub const ENTITY_COMPANIES: &str = "companies";
/// Entity type name for vehicles.
pub const ENTITY_AUTO: &str = "auto";
/// Entity type name for weighbridge operators.
pub const ENTITY_USERS: &str = "users";

const BUILTIN_ENTITY_TYPES: &[&str] = &[
    ENTITY_TRASH_CATS,
    ENTITY_TRASH_TYPES,
    ENTITY_COMPANIES,
    ENTITY_AUTO,
    ENTITY_USERS,
];

/// Returns entity type names registered at process start.
pub fn builtin_entity_types() -> &'static [&'static str] {
    BUILTIN_ENTITY_TYPES
}

/// One deliverable record of a named entity type.
///
/// Implemented by every payload shape a sender can submit. Runtime-registered
/// entity types provide their own implementation next to their sender.
pub trait EntityPayload: Debug {
    /// Registry name this payload belongs to.
    fn entity_type(&self) -> &str;
    /// Destination command that creates this record.
    fn wire_method(&self) -> &str;
    /// Command parameters, with the source record id attached.
    fn wire_params(&self, source_record_id: SourceRecordId) -> Value;
}

/// Waste category record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashCategory {
    pub name: String,
}

impl EntityPayload for TrashCategory {
    fn entity_type(&self) -> &str {
        ENTITY_TRASH_CATS
    }

    fn wire_method(&self) -> &str {
        "add_trash_cat"
    }

    fn wire_params(&self, source_record_id: SourceRecordId) -> Value {
        json!({
            "cat_name": self.name,
            "wserver_id": source_record_id,
        })
    }
}

/// Waste type record, bound to a category already known to the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashType {
    pub name: String,
    /// Destination-side id of the parent category.
    pub category_id: i64,
}

impl EntityPayload for TrashType {
    fn entity_type(&self) -> &str {
        ENTITY_TRASH_TYPES
    }

    fn wire_method(&self) -> &str {
        "add_trash_type"
    }

    fn wire_params(&self, source_record_id: SourceRecordId) -> Value {
        json!({
            "type_name": self.name,
            "wserver_id": source_record_id,
            "wserver_cat_id": self.category_id,
        })
    }
}

/// Carrier company record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    /// Taxpayer number.
    pub inn: Option<String>,
    /// Registration reason code.
    pub kpp: Option<String>,
    /// Identifier in an external accounting system.
    pub ex_id: Option<String>,
    pub status: Option<bool>,
}

impl EntityPayload for Company {
    fn entity_type(&self) -> &str {
        ENTITY_COMPANIES
    }

    fn wire_method(&self) -> &str {
        "add_carrier"
    }

    fn wire_params(&self, source_record_id: SourceRecordId) -> Value {
        json!({
            "name": self.name,
            "inn": self.inn,
            "kpp": self.kpp,
            "ex_id": self.ex_id,
            "status": self.status,
            "wserver_id": source_record_id,
        })
    }
}

/// Vehicle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Registration plate.
    pub car_number: String,
    pub model: String,
    pub rfid: Option<String>,
    /// Identification method (plate recognition, RFID tag, ...).
    pub id_type: String,
    /// Registered tare weight in kilograms.
    pub rg_weight: Option<i64>,
}

impl EntityPayload for Vehicle {
    fn entity_type(&self) -> &str {
        ENTITY_AUTO
    }

    fn wire_method(&self) -> &str {
        "add_auto"
    }

    fn wire_params(&self, source_record_id: SourceRecordId) -> Value {
        json!({
            "car_number": self.car_number,
            "wserver_id": source_record_id,
            "model": self.model,
            "rfid": self.rfid,
            "id_type": self.id_type,
            "rg_weight": self.rg_weight,
        })
    }
}

/// Weighbridge operator account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub full_name: String,
    pub username: String,
    pub password: String,
}

impl Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("full_name", &self.full_name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl EntityPayload for Operator {
    fn entity_type(&self) -> &str {
        ENTITY_USERS
    }

    fn wire_method(&self) -> &str {
        "add_operator"
    }

    fn wire_params(&self, source_record_id: SourceRecordId) -> Value {
        json!({
            "full_name": self.full_name,
            "username": self.username,
            "password": self.password,
            "wserver_id": source_record_id,
        })
    }
}
