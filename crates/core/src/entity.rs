//! Payload schemas of the positioned entities.
//!
//! Payloads are opaque to the ordering machinery. They are validated here
//! once at the boundary and persisted as JSON.

use crate::attachment::AttachmentSpec;
use crate::collection::CollectionType;
use crate::validate;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_ATTACHMENTS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EducationKind {
    School,
    College,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchoolClass {
    X,
    XII,
}

/// A school or college education entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    #[serde(rename = "type")]
    pub kind: EducationKind,
    pub institute_name: String,
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<SchoolClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_year: Option<String>,
}

impl Education {
    pub fn validate(&self) -> Result<()> {
        validate::length("institute_name", &self.institute_name, 4, 100)?;
        validate::length("grade", &self.grade, 1, 10)?;
        if !self.grade.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(Error::validation("grade", "must be numeric"));
        }

        match self.kind {
            EducationKind::College => {
                let degree = required("degree", self.degree.as_deref())?;
                validate::length("degree", degree, 4, 100)?;
                let field = required("field_of_study", self.field_of_study.as_deref())?;
                validate::length("field_of_study", field, 4, 100)?;
                let start = validate::year_in_range(
                    "start_year",
                    required("start_year", self.start_year.as_deref())?,
                    20,
                    10,
                )?;
                let end = validate::year_in_range(
                    "end_year",
                    required("end_year", self.end_year.as_deref())?,
                    20,
                    10,
                )?;
                if end < start {
                    return Err(Error::validation("end_year", "must not precede start_year"));
                }
            }
            EducationKind::School => {
                if self.class.is_none() {
                    return Err(Error::validation("class", "required for SCHOOL"));
                }
                validate::year_in_range(
                    "passing_year",
                    required("passing_year", self.passing_year.as_deref())?,
                    20,
                    10,
                )?;
            }
        }
        Ok(())
    }
}

/// A completed course or certification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    pub title: String,
    pub description: String,
    pub completion_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_link: Option<String>,
    pub skills_used: Vec<String>,
}

impl Certification {
    pub fn validate(&self) -> Result<()> {
        validate::length("title", &self.title, 4, 100)?;
        validate::length("description", &self.description, 10, 2000)?;
        validate::date("completion_date", &self.completion_date)?;
        validate::optional_url("certificate_link", self.certificate_link.as_deref())?;
        validate::string_list("skills_used", &self.skills_used, 3, 20)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HackathonPlatform {
    Github,
    Website,
    Social,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectPlatform {
    Demo,
    Website,
    SourceCode,
}

/// An external link shown next to an entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link<P> {
    pub platform: P,
    pub label: String,
    pub url: String,
}

impl<P> Link<P> {
    fn validate(&self) -> Result<()> {
        validate::length("links.label", &self.label, 2, 100)?;
        validate::url("links.url", &self.url)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hackathon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub title: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_link: Option<String>,
    #[serde(default)]
    pub links: Vec<Link<HackathonPlatform>>,
}

impl Hackathon {
    pub fn validate(&self) -> Result<()> {
        validate::optional_url("avatar", self.avatar.as_deref())?;
        validate::length("title", &self.title, 3, 150)?;
        validate::length("location", &self.location, 5, 200)?;
        let start = validate::date("start_date", &self.start_date)?;
        let end = validate::date("end_date", &self.end_date)?;
        if end < start {
            return Err(Error::validation("end_date", "must not precede start_date"));
        }
        validate::length("description", &self.description, 10, 2000)?;
        validate::optional_url("certificate_link", self.certificate_link.as_deref())?;
        self.links.iter().try_for_each(Link::validate)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    PartTime,
    SemiFullTime,
    FullTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    pub job_type: JobType,
    pub job_title: String,
    pub location: String,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub description: String,
    pub skills_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_link: Option<String>,
}

impl WorkExperience {
    pub fn validate(&self) -> Result<()> {
        validate::length("company_name", &self.company_name, 3, 150)?;
        validate::optional_url("company_url", self.company_url.as_deref())?;
        validate::length("job_title", &self.job_title, 5, 200)?;
        validate::length("location", &self.location, 5, 200)?;
        let start = validate::date("start_date", &self.start_date)?;
        if let Some(end) = self.end_date.as_deref().filter(|s| !s.is_empty()) {
            if validate::date("end_date", end)? < start {
                return Err(Error::validation("end_date", "must not precede start_date"));
            }
        }
        validate::length("description", &self.description, 10, 2000)?;
        validate::string_list("skills_used", &self.skills_used, 3, 20)?;
        validate::optional_url("certificate_link", self.certificate_link.as_deref())
    }
}

/// A work-gallery project. The only entity that owns attachments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkGalleryProject {
    pub title: String,
    pub description: String,
    pub tech_used: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link<ProjectPlatform>>,
    /// Never persisted with the payload; reconciled into the attachments table.
    #[serde(default, skip_serializing)]
    pub attachments: Vec<AttachmentSpec>,
}

impl WorkGalleryProject {
    pub fn validate(&self) -> Result<()> {
        validate::length("title", &self.title, 4, 100)?;
        validate::length("description", &self.description, 10, 2000)?;
        validate::string_list("tech_used", &self.tech_used, 3, 20)?;
        self.links.iter().try_for_each(Link::validate)?;
        if self.attachments.len() > MAX_ATTACHMENTS {
            return Err(Error::validation(
                "attachments",
                format!("at most {MAX_ATTACHMENTS} attachments allowed"),
            ));
        }
        self.attachments.iter().try_for_each(AttachmentSpec::validate)
    }
}

/// A validated payload of one of the collection types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityPayload {
    Education(Education),
    Certification(Certification),
    Hackathon(Hackathon),
    WorkExperience(WorkExperience),
    WorkGallery(WorkGalleryProject),
}

impl EntityPayload {
    /// Deserialize `value` with the schema of `collection` and validate it.
    pub fn parse(collection: CollectionType, value: Value) -> Result<Self> {
        let payload = match collection {
            CollectionType::Education => Self::Education(from_value(value)?),
            CollectionType::Certification => Self::Certification(from_value(value)?),
            CollectionType::Hackathon => Self::Hackathon(from_value(value)?),
            CollectionType::WorkExperience => Self::WorkExperience(from_value(value)?),
            CollectionType::WorkGallery => Self::WorkGallery(from_value(value)?),
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn collection(&self) -> CollectionType {
        match self {
            Self::Education(_) => CollectionType::Education,
            Self::Certification(_) => CollectionType::Certification,
            Self::Hackathon(_) => CollectionType::Hackathon,
            Self::WorkExperience(_) => CollectionType::WorkExperience,
            Self::WorkGallery(_) => CollectionType::WorkGallery,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Education(p) => p.validate(),
            Self::Certification(p) => p.validate(),
            Self::Hackathon(p) => p.validate(),
            Self::WorkExperience(p) => p.validate(),
            Self::WorkGallery(p) => p.validate(),
        }
    }

    /// Submitted attachments, for collections that carry them.
    pub fn attachments(&self) -> Option<&[AttachmentSpec]> {
        match self {
            Self::WorkGallery(p) => Some(&p.attachments),
            _ => None,
        }
    }

    /// JSON persisted in the `payload` column (attachments excluded).
    pub fn to_stored(&self) -> Result<Value> {
        let value = match self {
            Self::Education(p) => serde_json::to_value(p),
            Self::Certification(p) => serde_json::to_value(p),
            Self::Hackathon(p) => serde_json::to_value(p),
            Self::WorkExperience(p) => serde_json::to_value(p),
            Self::WorkGallery(p) => serde_json::to_value(p),
        };
        value.map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::validation("body", e.to_string()))
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::validation(field, "required"))
}
