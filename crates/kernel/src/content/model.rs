//! Content records and content types.
//!
//! Every content type shares one table and one row shape ([`Content`]).
//! A [`ContentType`] decides which of the optional fields a record of
//! that type actually carries; [`TypedContent`] applies that mask.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use thiserror::Error;

/// The type column held a value no content type answers to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown content type '{0}'")]
pub struct UnknownContentType(pub String);

/// Optional fields whose presence depends on the content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentField {
    Teaser,
    Description,
    Media,
    Format,
    FileSize,
    Creator,
    Image,
    Caption,
    Date,
    Parent,
    Language,
    Rights,
    Publisher,
}

/// Closed set of content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Audio,
    Collection,
    Download,
    Image,
    Tag,
    Video,
}

const ALL_FIELDS: &[ContentField] = &[
    ContentField::Teaser,
    ContentField::Description,
    ContentField::Media,
    ContentField::Format,
    ContentField::FileSize,
    ContentField::Creator,
    ContentField::Image,
    ContentField::Caption,
    ContentField::Date,
    ContentField::Parent,
    ContentField::Language,
    ContentField::Rights,
    ContentField::Publisher,
];

/// Images are the media themselves, so they carry no attachment.
const IMAGE_FIELDS: &[ContentField] = &[
    ContentField::Teaser,
    ContentField::Description,
    ContentField::Creator,
    ContentField::Image,
    ContentField::Caption,
    ContentField::Date,
    ContentField::Parent,
    ContentField::Language,
    ContentField::Rights,
    ContentField::Publisher,
];

const TAG_FIELDS: &[ContentField] = &[
    ContentField::Teaser,
    ContentField::Description,
    ContentField::Image,
    ContentField::Caption,
    ContentField::Language,
];

impl ContentType {
    pub const ALL: [ContentType; 7] = [
        ContentType::Article,
        ContentType::Audio,
        ContentType::Collection,
        ContentType::Download,
        ContentType::Image,
        ContentType::Tag,
        ContentType::Video,
    ];

    /// Machine name stored in the type column.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Audio => "audio",
            ContentType::Collection => "collection",
            ContentType::Download => "download",
            ContentType::Image => "image",
            ContentType::Tag => "tag",
            ContentType::Video => "video",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ContentType::Article => "Article",
            ContentType::Audio => "Audio",
            ContentType::Collection => "Collection",
            ContentType::Download => "Download",
            ContentType::Image => "Image",
            ContentType::Tag => "Tag",
            ContentType::Video => "Video",
        }
    }

    /// Optional fields records of this type carry.
    pub fn fields(self) -> &'static [ContentField] {
        match self {
            ContentType::Image => IMAGE_FIELDS,
            ContentType::Tag => TAG_FIELDS,
            ContentType::Article
            | ContentType::Audio
            | ContentType::Collection
            | ContentType::Download
            | ContentType::Video => ALL_FIELDS,
        }
    }

    pub fn has_field(self, field: ContentField) -> bool {
        self.fields().contains(&field)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownContentType(s.to_string()))
    }
}

/// Content record as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    pub id: i64,

    /// Content type machine name.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub content_type: String,

    pub title: String,
    pub teaser: String,
    pub description: String,

    /// Attached media file name.
    pub media: Option<String>,

    /// MIME type of the media file.
    pub format: Option<String>,

    /// Media file size in bytes.
    pub file_size: Option<i64>,

    pub creator: Option<String>,
    pub image: Option<String>,
    pub caption: Option<String>,

    /// Publication date as entered (YYYY-MM-DD).
    pub date: Option<String>,

    /// Parent collection ID.
    pub parent: Option<i64>,

    /// Language code.
    pub language: String,

    /// Licence identifier.
    pub rights: Option<i32>,

    pub publisher: Option<String>,

    /// Publication status (0 = offline, 1 = online).
    pub online_status: i16,

    /// Unix timestamp when submitted.
    pub submission_time: i64,

    /// Unix timestamp when last changed.
    pub last_updated: i64,

    /// Unix timestamp after which the record should be hidden.
    pub expires_on: Option<i64>,

    /// View counter.
    pub counter: i64,

    pub meta_title: Option<String>,
    pub meta_description: Option<String>,

    /// URL slug.
    pub seo: Option<String>,
}

impl Content {
    /// Check if this record is online.
    pub fn is_online(&self) -> bool {
        self.online_status == 1
    }

    /// Parse the stored type.
    pub fn kind(&self) -> Result<ContentType, UnknownContentType> {
        self.content_type.parse()
    }
}

/// A content record viewed through its type's field mask.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedContent {
    kind: ContentType,
    content: Content,
}

impl TypedContent {
    pub fn kind(&self) -> ContentType {
        self.kind
    }

    /// The underlying record, unmasked.
    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn id(&self) -> i64 {
        self.content.id
    }

    pub fn title(&self) -> &str {
        &self.content.title
    }

    pub fn is_online(&self) -> bool {
        self.content.is_online()
    }

    pub fn submission_time(&self) -> i64 {
        self.content.submission_time
    }

    pub fn counter(&self) -> i64 {
        self.content.counter
    }

    pub fn seo(&self) -> Option<&str> {
        self.content.seo.as_deref()
    }

    pub fn teaser(&self) -> Option<&str> {
        self.masked(ContentField::Teaser, Some(self.content.teaser.as_str()))
    }

    pub fn description(&self) -> Option<&str> {
        self.masked(
            ContentField::Description,
            Some(self.content.description.as_str()),
        )
    }

    pub fn media(&self) -> Option<&str> {
        self.masked(ContentField::Media, self.content.media.as_deref())
    }

    pub fn format(&self) -> Option<&str> {
        self.masked(ContentField::Format, self.content.format.as_deref())
    }

    pub fn file_size(&self) -> Option<i64> {
        self.masked(ContentField::FileSize, self.content.file_size)
    }

    pub fn creator(&self) -> Option<&str> {
        self.masked(ContentField::Creator, self.content.creator.as_deref())
    }

    pub fn image(&self) -> Option<&str> {
        self.masked(ContentField::Image, self.content.image.as_deref())
    }

    pub fn caption(&self) -> Option<&str> {
        self.masked(ContentField::Caption, self.content.caption.as_deref())
    }

    pub fn date(&self) -> Option<&str> {
        self.masked(ContentField::Date, self.content.date.as_deref())
    }

    pub fn parent(&self) -> Option<i64> {
        self.masked(ContentField::Parent, self.content.parent)
    }

    pub fn language(&self) -> Option<&str> {
        self.masked(ContentField::Language, Some(self.content.language.as_str()))
    }

    pub fn rights(&self) -> Option<i32> {
        self.masked(ContentField::Rights, self.content.rights)
    }

    pub fn publisher(&self) -> Option<&str> {
        self.masked(ContentField::Publisher, self.content.publisher.as_deref())
    }

    fn masked<T>(&self, field: ContentField, value: Option<T>) -> Option<T> {
        if self.kind.has_field(field) {
            value
        } else {
            None
        }
    }

    /// JSON representation containing only the fields this type carries.
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert("id".into(), json!(self.id()));
        map.insert("type".into(), json!(self.kind));
        map.insert("title".into(), json!(self.title()));

        let optional = [
            ("teaser", json!(self.teaser())),
            ("description", json!(self.description())),
            ("media", json!(self.media())),
            ("format", json!(self.format())),
            ("file_size", json!(self.file_size())),
            ("creator", json!(self.creator())),
            ("image", json!(self.image())),
            ("caption", json!(self.caption())),
            ("date", json!(self.date())),
            ("parent", json!(self.parent())),
            ("language", json!(self.language())),
            ("rights", json!(self.rights())),
            ("publisher", json!(self.publisher())),
        ];
        for (key, value) in optional {
            if !value.is_null() {
                map.insert(key.into(), value);
            }
        }

        map.insert("submission_time".into(), json!(self.submission_time()));
        map.insert("last_updated".into(), json!(self.content.last_updated));
        map.insert("counter".into(), json!(self.counter()));
        map.insert("meta_title".into(), json!(self.content.meta_title));
        map.insert("meta_description".into(), json!(self.content.meta_description));
        map.insert("seo".into(), json!(self.seo()));
        JsonValue::Object(map)
    }
}

impl TryFrom<Content> for TypedContent {
    type Error = UnknownContentType;

    fn try_from(content: Content) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: content.kind()?,
            content,
        })
    }
}
