//! Conversions between application types and BSON documents.

use bson::{Document, oid::ObjectId};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{MongoError, MongoResult};

/// Serialize a value that must encode as a document.
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> MongoResult<Document> {
    Ok(bson::to_document(value)?)
}

/// Deserialize one result document.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> MongoResult<T> {
    Ok(bson::from_document(doc)?)
}

/// Deserialize every result document; the first failure aborts.
pub fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> MongoResult<Vec<T>> {
    docs.into_iter().map(from_document).collect()
}

/// Parse a 24-character hex ObjectId.
pub fn parse_object_id(hex: &str) -> MongoResult<ObjectId> {
    ObjectId::parse_str(hex).map_err(|e| MongoError::invalid_object_id(format!("{}: {}", hex, e)))
}

/// The `_id` of a result document as an ObjectId.
pub fn object_id_of(doc: &Document) -> MongoResult<ObjectId> {
    doc.get_object_id("_id")
        .map_err(|_| MongoError::query("document has no ObjectId '_id'"))
}
