//! Manifest text header — UTF-8 `key:value` lines, terminated by an
//! empty line. Block records follow immediately after.
//!
//! Keys (matched case-insensitively on parse):
//!   fileName:<string>     optional
//!   fileSize:<u64>        optional
//!   blockSize:<u32>       required, > 0
//!   version:<u32>         required, currently 1
//!   files:<id1>,<id2>,... optional ancestor chain, oldest-dependency order
//!
//! Optional fields absent at encode time are omitted entirely and come
//! back as None — never defaulted to a sentinel business value.

use anyhow::Result;

use crate::consts::{MANIFEST_VERSION, MAX_BLOCK_SIZE};
use crate::errors::DiffError;

/// Parsed manifest header. The ancestor chain is fixed at creation time
/// and never mutated afterwards; generation N in a record resolves via
/// `chain[N - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestHeader {
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub block_size: u32,
    pub version: u32,
    pub chain: Vec<String>,
}

impl ManifestHeader {
    pub fn new(block_size: u32) -> Self {
        Self {
            file_name: None,
            file_size: None,
            block_size,
            version: MANIFEST_VERSION,
            chain: Vec::new(),
        }
    }

    pub fn with_file_name<S: Into<String>>(mut self, name: Option<S>) -> Self {
        self.file_name = name.map(Into::into);
        self
    }

    pub fn with_file_size(mut self, size: Option<u64>) -> Self {
        self.file_size = size;
        self
    }

    pub fn with_chain(mut self, chain: Vec<String>) -> Self {
        self.chain = chain;
        self
    }

    /// Render the header text, including the terminating blank line.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        if let Some(name) = &self.file_name {
            out.push_str("fileName:");
            out.push_str(name);
            out.push('\n');
        }
        if let Some(size) = self.file_size {
            out.push_str(&format!("fileSize:{size}\n"));
        }
        out.push_str(&format!("blockSize:{}\n", self.block_size));
        out.push_str(&format!("version:{}\n", self.version));
        if !self.chain.is_empty() {
            out.push_str("files:");
            out.push_str(&self.chain.join(","));
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Parse header text (everything up to, not including, the blank line).
    ///
    /// Unknown keys are ignored for forward compatibility. Values are
    /// split on the first ':' only, so file names may contain colons.
    pub fn parse(text: &str) -> Result<Self> {
        let mut file_name = None;
        let mut file_size = None;
        let mut block_size: Option<u32> = None;
        let mut version: Option<u32> = None;
        let mut chain = Vec::new();

        for line in text.split('\n') {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (key, value) = match line.split_once(':') {
                Some(kv) => kv,
                None => {
                    return Err(DiffError::BadHeader(format!("line without ':': {line:?}")).into())
                }
            };
            match key.to_ascii_lowercase().as_str() {
                "filename" => file_name = Some(value.to_string()),
                "filesize" => {
                    let n = value.trim().parse::<u64>().map_err(|_| {
                        DiffError::BadHeader(format!("fileSize not a number: {value:?}"))
                    })?;
                    file_size = Some(n);
                }
                "blocksize" => {
                    let n = value.trim().parse::<u32>().map_err(|_| {
                        DiffError::BadHeader(format!("blockSize not a number: {value:?}"))
                    })?;
                    block_size = Some(n);
                }
                "version" => {
                    let n = value.trim().parse::<u32>().map_err(|_| {
                        DiffError::BadHeader(format!("version not a number: {value:?}"))
                    })?;
                    version = Some(n);
                }
                "files" => {
                    chain = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {} // ignore unknown keys
            }
        }

        let version = version.ok_or_else(|| DiffError::BadHeader("missing version".into()))?;
        if version != MANIFEST_VERSION {
            return Err(DiffError::UnsupportedVersion {
                found: version,
                expected: MANIFEST_VERSION,
            }
            .into());
        }
        let block_size =
            block_size.ok_or_else(|| DiffError::BadHeader("missing blockSize".into()))?;
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(DiffError::BadHeader(format!(
                "blockSize out of range: {block_size}"
            ))
            .into());
        }

        Ok(Self {
            file_name,
            file_size,
            block_size,
            version,
            chain,
        })
    }
}
