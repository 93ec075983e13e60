use crate::error::{Error, Field};
use serde::Deserialize;
use url::Url;

/// Which endpoint a payload arrived on; decides the required fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Address,
    Markup,
}

/// Request body as sent by the caller, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub markup: Option<String>,
    pub address: Option<Url>,
    pub title: String,
    pub output_stem: Option<String>,
}

impl RenderRequest {
    pub fn with_stem(mut self, stem: String) -> Self {
        self.output_stem = Some(stem);
        self
    }
}

impl Payload {
    /// Decodes a JSON, XML or form-encoded body. A missing content type is
    /// treated as JSON.
    ///
    /// XML bodies carry the fields as child elements of any root element,
    /// e.g. `<request><title>..</title><html><![CDATA[..]]></html></request>`.
    pub fn decode(content_type: Option<&str>, body: &[u8]) -> Result<Self, Error> {
        let mime = match content_type {
            Some(value) => value
                .parse::<mime::Mime>()
                .map_err(|err| Error::Parse(format!("invalid content type: {err}")))?,
            None => mime::APPLICATION_JSON,
        };

        if mime.essence_str() == mime::APPLICATION_JSON.essence_str()
            || mime.suffix() == Some(mime::JSON)
        {
            serde_json::from_slice(body).map_err(|err| Error::Parse(err.to_string()))
        } else if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            serde_urlencoded::from_bytes(body).map_err(|err| Error::Parse(err.to_string()))
        } else if is_xml(&mime) {
            let body = std::str::from_utf8(body).map_err(|err| Error::Parse(err.to_string()))?;
            quick_xml::de::from_str(body).map_err(|err| Error::Parse(err.to_string()))
        } else {
            Err(Error::Parse(format!(
                "unsupported content type: {}",
                mime.essence_str()
            )))
        }
    }

    /// Checks the fields required by `flow`, reporting the first one missing.
    pub fn validate(self, flow: Flow) -> Result<RenderRequest, Error> {
        match flow {
            Flow::Address => {
                let url = require(self.url, Field::Url)?;
                let title = require(self.title, Field::Title)?;
                Ok(RenderRequest {
                    markup: self.html.filter(|html| !html.trim().is_empty()),
                    address: Some(parse_address(&url)?),
                    title,
                    output_stem: None,
                })
            }
            Flow::Markup => {
                let html = require(self.html, Field::Html)?;
                let title = require(self.title, Field::Title)?;
                Ok(RenderRequest {
                    markup: Some(html),
                    address: None,
                    title,
                    output_stem: None,
                })
            }
        }
    }
}

fn is_xml(mime: &mime::Mime) -> bool {
    matches!(
        (mime.type_().as_str(), mime.subtype().as_str()),
        ("application", "xml") | ("text", "xml")
    ) || mime.suffix() == Some(mime::XML)
}

fn require(value: Option<String>, field: Field) -> Result<String, Error> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::MissingField(field)),
    }
}

fn parse_address(raw: &str) -> Result<Url, Error> {
    let url = Url::parse(raw.trim()).map_err(|err| Error::InvalidAddress(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::InvalidAddress(format!(
            "unsupported scheme `{scheme}`"
        ))),
    }
}
