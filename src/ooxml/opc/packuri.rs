//! Part names ("pack URIs") inside an OPC package.
//!
//! A pack URI is an absolute, slash-separated name such as `/word/document.xml`.
//! The ZIP member name is the same string without the leading slash.

/// URI of the package itself; package-level relationships hang off it.
pub const PACKAGE_URI: &str = "/";

/// URI of the content-types stream.
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

/// An absolute part name within a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a pack URI, rejecting names without a leading slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Build a pack URI from a ZIP member name.
    pub fn from_membername(name: &str) -> Self {
        PackURI {
            uri: format!("/{}", name.trim_start_matches('/')),
        }
    }

    /// Resolve a relationship target relative to the source's base URI.
    ///
    /// `("/word", "media/image1.png")` becomes `/word/media/image1.png`, and
    /// `..` segments are collapsed.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        if relative_ref.starts_with('/') {
            return Self::new(normalize(relative_ref));
        }
        let joined = if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(normalize(&joined))
    }

    /// Directory portion, `/` for top-level parts.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Last path segment.
    pub fn filename(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or("")
    }

    /// Extension without the dot, empty when there is none.
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        filename.rfind('.').map_or("", |pos| &filename[pos + 1..])
    }

    /// ZIP member name (no leading slash).
    #[inline]
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Target reference of this part as seen from `base_uri`.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();
        let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

        let mut segments: Vec<&str> = std::iter::repeat_n("..", from.len() - common).collect();
        segments.extend_from_slice(&to[common..]);
        segments.join("/")
    }

    /// Pack URI of the relationships part belonging to this part.
    pub fn rels_uri(&self) -> PackURI {
        let uri = match self.base_uri() {
            "/" => format!("/_rels/{}.rels", self.filename()),
            base => format!("{}/_rels/{}.rels", base, self.filename()),
        };
        PackURI { uri }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            _ => parts.push(part),
        }
    }
    format!("/{}", parts.join("/"))
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}
