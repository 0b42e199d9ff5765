//! Letter numbering: companies, document types and the letters themselves.

use crate::error::Result;
use crate::resource::{require_non_blank, require_selected, Resource, Validate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A company that letters are issued for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    /// Short code used in generated letter numbers, fixed after creation
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompany {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Company edit form. The code is not editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompany {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Validate for CreateCompany {
    fn validate(&self) -> Result<()> {
        require_non_blank("Company code", &self.code)?;
        require_non_blank("Company name", &self.name)
    }
}

impl Validate for UpdateCompany {
    fn validate(&self) -> Result<()> {
        require_non_blank("Company name", &self.name)
    }
}

impl Resource for Company {
    const PATH: &'static str = "companies";
    const LABEL: &'static str = "company";
    type Create = CreateCompany;
    type Update = UpdateCompany;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeForm {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for DocumentTypeForm {
    fn validate(&self) -> Result<()> {
        require_non_blank("Document type code", &self.code)?;
        require_non_blank("Document type name", &self.name)
    }
}

impl Resource for DocumentType {
    const PATH: &'static str = "document-types";
    const LABEL: &'static str = "document type";
    type Create = DocumentTypeForm;
    type Update = DocumentTypeForm;

    fn id(&self) -> i64 {
        self.id
    }
}

/// An issued letter. The number itself is assigned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterNumber {
    pub id: i64,
    #[serde(default)]
    pub number: String,
    pub letter_date: NaiveDate,
    pub subject: String,
    pub recipient: String,
    pub company_id: i64,
    pub document_type_id: i64,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub document_type_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterNumberForm {
    #[serde(default)]
    pub company_id: i64,
    #[serde(default)]
    pub document_type_id: i64,
    pub letter_date: NaiveDate,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Validate for LetterNumberForm {
    fn validate(&self) -> Result<()> {
        require_selected("company", self.company_id)?;
        require_selected("document type", self.document_type_id)?;
        require_non_blank("Subject", &self.subject)?;
        require_non_blank("Recipient", &self.recipient)
    }
}

impl Resource for LetterNumber {
    const PATH: &'static str = "letter-numbers";
    const LABEL: &'static str = "letter";
    type Create = LetterNumberForm;
    type Update = LetterNumberForm;

    fn id(&self) -> i64 {
        self.id
    }
}
