//! Remote objects as handed over by the federation client.

use chrono::{DateTime, Utc};
use url::Url;

/// A decoded ActivityStreams object.
///
/// Only [`RemoteObject::Note`] has an extraction rule. Every other variant is
/// named so dispatch stays exhaustive.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteObject {
    Note(Note),
    Actor(Actor),
    Attachment(Attachment),
    /// Anything else, carrying its declared `type`
    Unsupported { kind: String },
}

impl RemoteObject {
    /// The ActivityStreams type name of the object.
    pub fn kind(&self) -> &str {
        match self {
            RemoteObject::Note(_) => "Note",
            RemoteObject::Actor(actor) => actor.kind.as_str(),
            RemoteObject::Attachment(attachment) => attachment.kind.as_str(),
            RemoteObject::Unsupported { kind } => kind,
        }
    }
}

/// Either an embedded object or a link that still has to be dereferenced.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectRef<T> {
    Object(T),
    Link(Url),
}

/// A textual post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Note {
    pub url: Option<Url>,
    pub sensitive: bool,
    /// Summary or content warning (HTML)
    pub summary: Option<String>,
    /// Body (HTML)
    pub content: Option<String>,
    pub attributed_to: Option<ObjectRef<Actor>>,
    pub published: Option<DateTime<Utc>>,
    pub attachments: Vec<ObjectRef<Attachment>>,
}

/// Actor variants the client recognizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActorKind {
    #[default]
    Person,
    Service,
    Application,
    Group,
    Organization,
}

impl ActorKind {
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "Person" => Some(Self::Person),
            "Service" => Some(Self::Service),
            "Application" => Some(Self::Application),
            "Group" => Some(Self::Group),
            "Organization" => Some(Self::Organization),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Service => "Service",
            Self::Application => "Application",
            Self::Group => "Group",
            Self::Organization => "Organization",
        }
    }
}

/// The author of an object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Actor {
    pub kind: ActorKind,
    pub url: Option<Url>,
    pub preferred_username: Option<String>,
    pub name: Option<String>,
    /// Profile bio (HTML)
    pub summary: Option<String>,
    /// Actor-level request not to be indexed or proxied
    pub opt_out: bool,
}

/// Attachment variants the client recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentKind {
    Document,
    Image,
    Other(String),
}

impl AttachmentKind {
    pub fn from_type(kind: &str) -> Self {
        match kind {
            "Document" => Self::Document,
            "Image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Document => "Document",
            Self::Image => "Image",
            Self::Other(kind) => kind,
        }
    }
}

/// A file attached to a post.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub url: Option<Url>,
    pub media_type: Option<String>,
    /// Alt text
    pub name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Attachment {
    pub fn new(kind: AttachmentKind) -> Self {
        Self {
            kind,
            url: None,
            media_type: None,
            name: None,
            width: None,
            height: None,
        }
    }

    /// Declared `image/*` type, or an `Image` object whatever it declares.
    pub fn is_image(&self) -> bool {
        self.kind == AttachmentKind::Image
            || self
                .media_type
                .as_deref()
                .is_some_and(|t| t.to_ascii_lowercase().starts_with("image/"))
    }
}
