use crate::error::ParseError;
use crate::types::PipelineDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: PipelineDocument,
    pub format: DocumentFormat,
}

pub fn parse_document_str(input: &str, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    match format {
        DocumentFormat::Json => Ok(ParsedDocument {
            document: serde_json::from_str::<PipelineDocument>(input)?,
            format,
        }),
        DocumentFormat::Yaml => Ok(ParsedDocument {
            document: serde_yaml::from_str::<PipelineDocument>(input)?,
            format,
        }),
        DocumentFormat::Auto => parse_document_auto(input),
    }
}

pub fn parse_document_bytes(input: &[u8], format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    let text = std::str::from_utf8(input).map_err(|_| ParseError::UnknownFormat)?;
    parse_document_str(text, format)
}

fn parse_document_auto(input: &str) -> Result<ParsedDocument, ParseError> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Err(ParseError::UnknownFormat);
    }

    // JSON documents always open with `[` (pipeline) or `{` (legacy).
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return match serde_json::from_str::<PipelineDocument>(input) {
            Ok(document) => Ok(ParsedDocument {
                document,
                format: DocumentFormat::Json,
            }),
            Err(e) => match serde_yaml::from_str::<PipelineDocument>(input) {
                Ok(document) => Ok(ParsedDocument {
                    document,
                    format: DocumentFormat::Yaml,
                }),
                Err(_) => Err(ParseError::Json(e)),
            },
        };
    }

    serde_yaml::from_str::<PipelineDocument>(input)
        .map(|document| ParsedDocument {
            document,
            format: DocumentFormat::Yaml,
        })
        .map_err(ParseError::Yaml)
}
