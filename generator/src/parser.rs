// parser.rs — Model configuration parser
//
// Reads the JSON model configuration and builds the validated
// `ModelDescriptor`: top-level keys first, then the four channel sections in
// the order inports, outports, parameters, signals.
//
// Preconditions: input is UTF-8 JSON text.
// Postconditions: returns the model plus non-fatal warnings, or the first
//                 fatal `SchemaError`.
// Failure modes: missing keys, invalid identifiers, multi-dot names,
//                dimensions below 1, unknown data types, malformed JSON.
// Side effects: none.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::diag::{codes, DiagCode, DiagLevel, Diagnostic};
use crate::lexer::{self, Token};
use crate::model::{Category, Channel, ChannelKind, ChannelTable, DataType, ModelDescriptor};

// ── Public types ────────────────────────────────────────────────────────────

/// Result of a successful parse: the model plus any warnings.
#[derive(Debug)]
pub struct ParseResult {
    pub model: ModelDescriptor,
    pub diagnostics: Vec<Diagnostic>,
}

/// Why a channel name could not be split into category and leaf name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameError {
    TooManyDots,
    InvalidIdentifier,
}

/// Fatal configuration errors.
#[derive(Debug)]
pub enum SchemaError {
    /// The input is not JSON, or not shaped like a model config.
    Malformed(serde_json::Error),
    MissingKey {
        key: &'static str,
    },
    InvalidModelName {
        name: String,
    },
    InvalidBuilder,
    InvalidBaseRate {
        value: String,
    },
    MissingChannelName {
        location: String,
    },
    TooManyDots {
        location: String,
        name: String,
    },
    InvalidIdentifier {
        location: String,
        name: String,
    },
    InvalidDimension {
        location: String,
        field: &'static str,
        value: i64,
    },
    UnknownDataType {
        location: String,
        tag: String,
    },
    MalformedChannel {
        location: String,
        message: String,
    },
}

impl SchemaError {
    pub fn code(&self) -> DiagCode {
        match self {
            SchemaError::Malformed(_) => codes::MALFORMED_CONFIG,
            SchemaError::MissingKey { .. } => codes::MISSING_KEY,
            SchemaError::InvalidModelName { .. } => codes::INVALID_MODEL_NAME,
            SchemaError::InvalidBuilder => codes::INVALID_BUILDER,
            SchemaError::InvalidBaseRate { .. } => codes::INVALID_BASERATE,
            SchemaError::MissingChannelName { .. } => codes::MISSING_CHANNEL_NAME,
            SchemaError::TooManyDots { .. } => codes::TOO_MANY_DOTS,
            SchemaError::InvalidIdentifier { .. } => codes::INVALID_IDENTIFIER,
            SchemaError::InvalidDimension { .. } => codes::INVALID_DIMENSION,
            SchemaError::UnknownDataType { .. } => codes::UNKNOWN_DATA_TYPE,
            SchemaError::MalformedChannel { .. } => codes::MALFORMED_CHANNEL,
        }
    }

    /// Config entry the error refers to, if it concerns a single channel.
    pub fn location(&self) -> Option<&str> {
        match self {
            SchemaError::MissingChannelName { location }
            | SchemaError::TooManyDots { location, .. }
            | SchemaError::InvalidIdentifier { location, .. }
            | SchemaError::InvalidDimension { location, .. }
            | SchemaError::UnknownDataType { location, .. }
            | SchemaError::MalformedChannel { location, .. } => Some(location),
            _ => None,
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            SchemaError::TooManyDots { .. } => {
                Some("use at most one `.` to separate category and name")
            }
            SchemaError::InvalidIdentifier { .. } | SchemaError::InvalidModelName { .. } => {
                Some("identifiers must match [A-Za-z_][A-Za-z0-9_]*")
            }
            SchemaError::UnknownDataType { .. } => Some("supported types are \"double\" and \"i32\""),
            _ => None,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::new(DiagLevel::Error, self.to_string()).with_code(self.code());
        if let Some(location) = self.location() {
            diag = diag.with_location(location);
        }
        if let Some(hint) = self.hint() {
            diag = diag.with_hint(hint);
        }
        diag
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::Malformed(e) => write!(f, "malformed config: {}", e),
            SchemaError::MissingKey { key } => match *key {
                "name" => write!(f, "config does not define a model name"),
                "builder" => write!(f, "config does not define a model builder"),
                "baserate" => write!(f, "config does not define a model baserate"),
                other => write!(f, "config does not define `{}`", other),
            },
            SchemaError::InvalidModelName { name } => {
                write!(f, "model name `{}` is not a valid identifier", name)
            }
            SchemaError::InvalidBuilder => write!(f, "model builder must be a string"),
            SchemaError::InvalidBaseRate { value } => {
                write!(f, "baserate must be a positive number of seconds, got {}", value)
            }
            SchemaError::MissingChannelName { .. } => write!(f, "channel does not define a name"),
            SchemaError::TooManyDots { name, .. } => {
                write!(f, "name `{}` has more than one `.`", name)
            }
            SchemaError::InvalidIdentifier { name, .. } => {
                write!(f, "name `{}` is not a valid identifier", name)
            }
            SchemaError::InvalidDimension { field, value, .. } => {
                write!(f, "{} must be at least 1, got {}", field, value)
            }
            SchemaError::UnknownDataType { tag, .. } => write!(f, "unknown data type \"{}\"", tag),
            SchemaError::MalformedChannel { message, .. } => {
                write!(f, "malformed channel declaration: {}", message)
            }
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemaError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

// ── Raw config shapes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawConfig {
    name: Option<Value>,
    builder: Option<Value>,
    baserate: Option<Value>,
    #[serde(default)]
    inports: Vec<Value>,
    #[serde(default)]
    outports: Vec<Value>,
    #[serde(default)]
    parameters: Vec<Value>,
    #[serde(default)]
    signals: Vec<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawChannel {
    name: Option<String>,
    description: Option<String>,
    #[serde(rename = "type")]
    data_type: Option<String>,
    #[serde(rename = "dimX")]
    dim_x: Option<i64>,
    #[serde(rename = "dimY")]
    dim_y: Option<i64>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

// ── Public entry points ─────────────────────────────────────────────────────

/// Parse a JSON model configuration.
pub fn parse_config(json: &str) -> Result<ParseResult, SchemaError> {
    let raw: RawConfig = serde_json::from_str(json).map_err(SchemaError::Malformed)?;
    let mut diagnostics = Vec::new();

    let name = match raw.name {
        None => return Err(SchemaError::MissingKey { key: "name" }),
        Some(Value::String(name)) if lexer::is_identifier(&name) => name,
        Some(Value::String(name)) => return Err(SchemaError::InvalidModelName { name }),
        Some(other) => {
            return Err(SchemaError::InvalidModelName {
                name: other.to_string(),
            })
        }
    };

    let builder = match raw.builder {
        None => return Err(SchemaError::MissingKey { key: "builder" }),
        Some(Value::String(builder)) => builder,
        Some(_) => return Err(SchemaError::InvalidBuilder),
    };

    let base_rate = match raw.baserate {
        None => return Err(SchemaError::MissingKey { key: "baserate" }),
        Some(value) => parse_base_rate(&value)?,
    };

    for key in raw.extra.keys() {
        diagnostics.push(
            Diagnostic::warning(
                codes::UNKNOWN_KEY,
                format!("unknown top-level key `{}`; ignoring", key),
            )
            .with_location(key.as_str()),
        );
    }

    let inports = parse_channels(&raw.inports, ChannelKind::Inport, &mut diagnostics)?;
    let outports = parse_channels(&raw.outports, ChannelKind::Outport, &mut diagnostics)?;
    let parameters = parse_channels(&raw.parameters, ChannelKind::Parameter, &mut diagnostics)?;
    let signals = parse_channels(&raw.signals, ChannelKind::Signal, &mut diagnostics)?;

    Ok(ParseResult {
        model: ModelDescriptor {
            name,
            builder,
            base_rate,
            inports,
            outports,
            parameters,
            signals,
        },
        diagnostics,
    })
}

/// Parse the declarations of one channel section into a `ChannelTable`.
///
/// `kind` decides which optional fields apply: descriptions for signals,
/// data types for parameters and signals. Inapplicable or unknown fields
/// produce a warning and are ignored.
pub fn parse_channels(
    items: &[Value],
    kind: ChannelKind,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<ChannelTable, SchemaError> {
    let mut table = ChannelTable::new();
    for (index, item) in items.iter().enumerate() {
        let location = format!("{}[{}]", kind.section(), index);
        let (category, channel) = parse_channel(item, kind, &location, diagnostics)?;
        table.push(category, channel);
    }
    Ok(table)
}

/// Split a channel name into category and leaf name.
///
/// No dot yields the default category, one dot yields `(category, name)`.
pub fn split_channel_name(name: &str) -> Result<(Category, String), NameError> {
    let result = lexer::lex(name);
    let dots = result
        .tokens
        .iter()
        .filter(|(tok, _)| *tok == Token::Dot)
        .count();
    if dots > 1 {
        return Err(NameError::TooManyDots);
    }
    if !result.errors.is_empty() {
        return Err(NameError::InvalidIdentifier);
    }
    match result.tokens.as_slice() {
        [(Token::Ident, _)] => Ok((Category::Default, name.to_string())),
        [(Token::Ident, cat), (Token::Dot, _), (Token::Ident, leaf)] => Ok((
            Category::Named(name[cat.start..cat.end].to_string()),
            name[leaf.start..leaf.end].to_string(),
        )),
        _ => Err(NameError::InvalidIdentifier),
    }
}

// ── Internals ───────────────────────────────────────────────────────────────

fn parse_base_rate(value: &Value) -> Result<f64, SchemaError> {
    match value.as_f64() {
        Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => Err(SchemaError::InvalidBaseRate {
            value: value.to_string(),
        }),
    }
}

fn parse_channel(
    item: &Value,
    kind: ChannelKind,
    location: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Category, Channel), SchemaError> {
    let raw = match item {
        Value::String(name) => RawChannel {
            name: Some(name.clone()),
            ..RawChannel::default()
        },
        Value::Object(_) => {
            RawChannel::deserialize(item).map_err(|e| SchemaError::MalformedChannel {
                location: location.to_string(),
                message: e.to_string(),
            })?
        }
        other => {
            return Err(SchemaError::MalformedChannel {
                location: location.to_string(),
                message: format!("expected a name string or an object, got {}", other),
            })
        }
    };

    let full_name = raw.name.ok_or_else(|| SchemaError::MissingChannelName {
        location: location.to_string(),
    })?;
    let (category, name) = split_channel_name(&full_name).map_err(|e| match e {
        NameError::TooManyDots => SchemaError::TooManyDots {
            location: location.to_string(),
            name: full_name.clone(),
        },
        NameError::InvalidIdentifier => SchemaError::InvalidIdentifier {
            location: location.to_string(),
            name: full_name.clone(),
        },
    })?;

    let dim_x = resolve_dimension(raw.dim_x, "dimX", location)?;
    let dim_y = resolve_dimension(raw.dim_y, "dimY", location)?;

    let description = if kind.accepts_description() {
        Some(raw.description.unwrap_or_else(|| name.clone()))
    } else {
        if raw.description.is_some() {
            diagnostics.push(unused_field(kind, "description", location));
        }
        None
    };

    let data_type = match raw.data_type {
        Some(tag) if kind.accepts_type() => {
            DataType::from_config(&tag).ok_or_else(|| SchemaError::UnknownDataType {
                location: location.to_string(),
                tag: tag.clone(),
            })?
        }
        Some(_) => {
            diagnostics.push(unused_field(kind, "type", location));
            DataType::Double
        }
        None => DataType::Double,
    };

    for key in raw.extra.keys() {
        diagnostics.push(
            Diagnostic::warning(
                codes::UNUSED_FIELD,
                format!("unknown field `{}`; ignoring", key),
            )
            .with_location(location),
        );
    }

    Ok((
        category,
        Channel {
            name,
            dim_x,
            dim_y,
            description,
            data_type,
        },
    ))
}

fn resolve_dimension(
    value: Option<i64>,
    field: &'static str,
    location: &str,
) -> Result<u32, SchemaError> {
    let value = value.unwrap_or(1);
    match u32::try_from(value) {
        Ok(dim) if dim >= 1 => Ok(dim),
        _ => Err(SchemaError::InvalidDimension {
            location: location.to_string(),
            field,
            value,
        }),
    }
}

fn unused_field(kind: ChannelKind, field: &str, location: &str) -> Diagnostic {
    Diagnostic::warning(
        codes::UNUSED_FIELD,
        format!("field `{}` is not used for {}; ignoring", field, kind.section()),
    )
    .with_location(location)
}

// ── Tests ───────────────────────────────────────────────────────────────────
