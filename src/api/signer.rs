//! Request signing.
//!
//! The three signature algorithms of the mobile client are not implemented
//! here. Each one is a [`Signer`] supplied from outside the crate; the
//! [`SignaturePipeline`] only fixes the inputs they receive and how their
//! outputs are combined into one header set.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use md5::{Digest, Md5};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::api::device::unix_now;
use crate::error::{Error, Result};

/// Everything a signer may sign over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInput {
    /// Serialized query string, exactly as sent.
    pub params: String,
    /// Shared request timestamp in seconds.
    pub timestamp: i64,
    /// Cookie header value, if any.
    pub cookies: Option<String>,
    /// Uppercase MD5 of the request body, if any.
    pub body_hash: Option<String>,
}

/// Signature headers for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeaderSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_gorgon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_khronos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_ticket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_ladon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_argus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_stub: Option<String>,
}

impl SignatureHeaderSet {
    /// Header name/value pairs for every populated field.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        [
            ("X-Gorgon", &self.x_gorgon),
            ("X-Khronos", &self.x_khronos),
            ("X-SS-REQ-TICKET", &self.x_ticket),
            ("X-Ladon", &self.x_ladon),
            ("X-Argus", &self.x_argus),
            ("X-SS-STUB", &self.x_stub),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (name, v))
        })
        .collect()
    }

    /// Convert into a reqwest header map.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in self.headers() {
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::signature(name, format!("invalid header value: {}", e)))?;
            map.insert(HeaderName::from_static(lowercase_name(name)), value);
        }
        Ok(map)
    }

    /// Copy the fields owned by `kind` from `output`, skipping empty values.
    fn absorb(&mut self, kind: SignerKind, output: SignatureHeaderSet) {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        match kind {
            SignerKind::Gorgon => {
                self.x_gorgon = keep(output.x_gorgon);
                self.x_khronos = keep(output.x_khronos);
                self.x_ticket = keep(output.x_ticket);
            }
            SignerKind::Ladon => self.x_ladon = keep(output.x_ladon),
            SignerKind::Argus => self.x_argus = keep(output.x_argus),
        }
    }
}

fn lowercase_name(name: &'static str) -> &'static str {
    match name {
        "X-Gorgon" => "x-gorgon",
        "X-Khronos" => "x-khronos",
        "X-SS-REQ-TICKET" => "x-ss-req-ticket",
        "X-Ladon" => "x-ladon",
        "X-Argus" => "x-argus",
        _ => "x-ss-stub",
    }
}

/// The three signature algorithms of the mobile client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerKind {
    /// Produces `X-Gorgon`, `X-Khronos` and `X-SS-REQ-TICKET`.
    Gorgon,
    /// Produces `X-Ladon`.
    Ladon,
    /// Produces `X-Argus`.
    Argus,
}

impl SignerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerKind::Gorgon => "gorgon",
            SignerKind::Ladon => "ladon",
            SignerKind::Argus => "argus",
        }
    }
}

/// A pluggable signature algorithm.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Compute this signer's header fields. Fields it does not own are ignored.
    async fn sign(&self, input: &SignInput) -> Result<SignatureHeaderSet>;
}

/// Combines three signers into one header set per request.
#[derive(Clone)]
pub struct SignaturePipeline {
    gorgon: Arc<dyn Signer>,
    ladon: Arc<dyn Signer>,
    argus: Arc<dyn Signer>,
}

impl SignaturePipeline {
    pub fn new(gorgon: Arc<dyn Signer>, ladon: Arc<dyn Signer>, argus: Arc<dyn Signer>) -> Self {
        Self {
            gorgon,
            ladon,
            argus,
        }
    }

    /// Pipeline backed by one external signing program.
    pub fn from_command(program: &Path, timeout: Duration) -> Self {
        let make = |kind| -> Arc<dyn Signer> { Arc::new(CommandSigner::new(program, kind, timeout)) };
        Self::new(
            make(SignerKind::Gorgon),
            make(SignerKind::Ladon),
            make(SignerKind::Argus),
        )
    }

    /// Pipeline whose signers always fail. Unsigned endpoints still work.
    pub fn unconfigured() -> Self {
        Self::new(
            Arc::new(UnconfiguredSigner(SignerKind::Gorgon)),
            Arc::new(UnconfiguredSigner(SignerKind::Ladon)),
            Arc::new(UnconfiguredSigner(SignerKind::Argus)),
        )
    }

    /// Sign a request at the current time.
    pub async fn sign(
        &self,
        params: &str,
        cookies: Option<&str>,
        body: Option<&str>,
    ) -> Result<SignatureHeaderSet> {
        self.sign_at(unix_now(), params, cookies, body).await
    }

    /// Sign a request at a fixed timestamp.
    pub async fn sign_at(
        &self,
        timestamp: i64,
        params: &str,
        cookies: Option<&str>,
        body: Option<&str>,
    ) -> Result<SignatureHeaderSet> {
        let body_hash = body.map(body_stub);
        let input = SignInput {
            params: params.to_string(),
            timestamp,
            cookies: cookies.filter(|c| !c.is_empty()).map(str::to_string),
            body_hash: body_hash.clone(),
        };

        let (gorgon, ladon, argus) = futures::try_join!(
            self.gorgon.sign(&input),
            self.ladon.sign(&input),
            self.argus.sign(&input),
        )?;

        let mut headers = SignatureHeaderSet {
            x_stub: body_hash,
            ..Default::default()
        };
        headers.absorb(SignerKind::Gorgon, gorgon);
        headers.absorb(SignerKind::Ladon, ladon);
        headers.absorb(SignerKind::Argus, argus);

        tracing::debug!(
            "Signed request at {} ({} header(s))",
            timestamp,
            headers.headers().len()
        );

        Ok(headers)
    }
}

/// Uppercase hex MD5 of a request body.
pub fn body_stub(body: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(body.as_bytes());
    format!("{:X}", hasher.finalize())
}

/// Stand-in used when no signer is configured.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredSigner(pub SignerKind);

#[async_trait]
impl Signer for UnconfiguredSigner {
    async fn sign(&self, _input: &SignInput) -> Result<SignatureHeaderSet> {
        Err(Error::signature(
            self.0.as_str(),
            "no signer configured (set signer.command or TIKTOK_SIGNER)",
        ))
    }
}

/// Signer that delegates to an external program.
///
/// The program is called as `<program> <gorgon|ladon|argus>`, receives the
/// [`SignInput`] as JSON on stdin and must print a JSON object with the
/// `x_*` fields it produces.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    program: PathBuf,
    kind: SignerKind,
    timeout: Duration,
}

impl CommandSigner {
    pub fn new(program: &Path, kind: SignerKind, timeout: Duration) -> Self {
        Self {
            program: program.to_path_buf(),
            kind,
            timeout,
        }
    }

    async fn run(&self, input: &SignInput) -> Result<Vec<u8>> {
        let name = self.kind.as_str();
        let payload = serde_json::to_vec(input)?;

        let mut child = Command::new(&self.program)
            .arg(name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::signature(
                    name,
                    format!("failed to run {}: {}", self.program.display(), e),
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|e| Error::signature(name, format!("failed to write input: {}", e)))?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::signature(name, "signer timed out"))?
            .map_err(|e| Error::signature(name, format!("signer failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::signature(
                name,
                format!("signer exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Signer for CommandSigner {
    async fn sign(&self, input: &SignInput) -> Result<SignatureHeaderSet> {
        let stdout = self.run(input).await?;
        serde_json::from_slice(&stdout).map_err(|e| {
            Error::signature(self.kind.as_str(), format!("invalid signer output: {}", e))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Deterministic signer deriving its fields from the input.
    pub(crate) struct FakeSigner(pub SignerKind);

    #[async_trait]
    impl Signer for FakeSigner {
        async fn sign(&self, input: &SignInput) -> Result<SignatureHeaderSet> {
            let digest = body_stub(&format!(
                "{}|{}|{}|{}|{}",
                self.0.as_str(),
                input.params,
                input.timestamp,
                input.cookies.as_deref().unwrap_or(""),
                input.body_hash.as_deref().unwrap_or("")
            ));
            Ok(match self.0 {
                SignerKind::Gorgon => SignatureHeaderSet {
                    x_gorgon: Some(digest),
                    x_khronos: Some(input.timestamp.to_string()),
                    x_ticket: Some(format!("{}000", input.timestamp)),
                    // Not owned by this signer, must be dropped.
                    x_argus: Some("leak".into()),
                    ..Default::default()
                },
                SignerKind::Ladon => SignatureHeaderSet {
                    x_ladon: Some(digest),
                    ..Default::default()
                },
                SignerKind::Argus => SignatureHeaderSet {
                    x_argus: Some(digest),
                    ..Default::default()
                },
            })
        }
    }

    struct FailingSigner;

    #[async_trait]
    impl Signer for FailingSigner {
        async fn sign(&self, _input: &SignInput) -> Result<SignatureHeaderSet> {
            Err(Error::signature("argus", "boom"))
        }
    }

    struct EmptySigner;

    #[async_trait]
    impl Signer for EmptySigner {
        async fn sign(&self, _input: &SignInput) -> Result<SignatureHeaderSet> {
            Ok(SignatureHeaderSet {
                x_ladon: Some(String::new()),
                ..Default::default()
            })
        }
    }

    pub(crate) fn fake_pipeline() -> SignaturePipeline {
        SignaturePipeline::new(
            Arc::new(FakeSigner(SignerKind::Gorgon)),
            Arc::new(FakeSigner(SignerKind::Ladon)),
            Arc::new(FakeSigner(SignerKind::Argus)),
        )
    }

    #[tokio::test]
    async fn test_sign_is_repeatable_for_fixed_inputs() {
        let pipeline = fake_pipeline();
        let a = pipeline.sign_at(1700000000, "a=1&b=2", Some("sid=x"), None).await.unwrap();
        let b = pipeline.sign_at(1700000000, "a=1&b=2", Some("sid=x"), None).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.x_khronos.as_deref(), Some("1700000000"));
    }

    #[tokio::test]
    async fn test_single_character_change_changes_headers() {
        let pipeline = fake_pipeline();
        let base = pipeline.sign_at(1700000000, "a=1&b=2", None, None).await.unwrap();
        let params = pipeline.sign_at(1700000000, "a=1&b=3", None, None).await.unwrap();
        let time = pipeline.sign_at(1700000001, "a=1&b=2", None, None).await.unwrap();
        let cookie = pipeline.sign_at(1700000000, "a=1&b=2", Some("x"), None).await.unwrap();
        let body = pipeline.sign_at(1700000000, "a=1&b=2", None, Some("q")).await.unwrap();
        assert_ne!(base, params);
        assert_ne!(base, time);
        assert_ne!(base, cookie);
        assert_ne!(base, body);
    }

    #[tokio::test]
    async fn test_all_headers_share_one_timestamp() {
        let headers = fake_pipeline()
            .sign_at(1700000123, "a=1", None, None)
            .await
            .unwrap();
        assert_eq!(headers.x_khronos.as_deref(), Some("1700000123"));
        assert_eq!(headers.x_ticket.as_deref(), Some("1700000123000"));
    }

    #[tokio::test]
    async fn test_foreign_fields_are_dropped() {
        let headers = fake_pipeline().sign_at(1, "a=1", None, None).await.unwrap();
        assert_ne!(headers.x_argus.as_deref(), Some("leak"));
        assert!(headers.x_argus.is_some());
    }

    #[tokio::test]
    async fn test_body_produces_uppercase_stub() {
        let headers = fake_pipeline()
            .sign_at(1, "a=1", None, Some("hello"))
            .await
            .unwrap();
        assert_eq!(
            headers.x_stub.as_deref(),
            Some("5D41402ABC4B2A76B9719D911017C592")
        );
    }

    #[tokio::test]
    async fn test_no_body_means_no_stub() {
        let headers = fake_pipeline().sign_at(1, "a=1", None, None).await.unwrap();
        assert!(headers.x_stub.is_none());
        assert_eq!(headers.headers().len(), 5);
    }

    #[tokio::test]
    async fn test_signer_failure_propagates() {
        let pipeline = SignaturePipeline::new(
            Arc::new(FakeSigner(SignerKind::Gorgon)),
            Arc::new(FakeSigner(SignerKind::Ladon)),
            Arc::new(FailingSigner),
        );
        let err = pipeline.sign_at(1, "a=1", None, None).await.unwrap_err();
        assert!(matches!(err, Error::Signature { .. }));
    }

    #[tokio::test]
    async fn test_unconfigured_pipeline_fails() {
        let err = SignaturePipeline::unconfigured()
            .sign("a=1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Signature { .. }));
    }

    #[tokio::test]
    async fn test_empty_outputs_are_omitted() {
        let pipeline = SignaturePipeline::new(
            Arc::new(FakeSigner(SignerKind::Gorgon)),
            Arc::new(EmptySigner),
            Arc::new(FakeSigner(SignerKind::Argus)),
        );
        let headers = pipeline.sign_at(1, "a=1", None, None).await.unwrap();
        assert!(headers.x_ladon.is_none());
        assert!(headers.headers().iter().all(|(name, _)| *name != "X-Ladon"));
    }

    #[test]
    fn test_header_map_names() {
        let set = SignatureHeaderSet {
            x_gorgon: Some("g".into()),
            x_stub: Some("S".into()),
            ..Default::default()
        };
        let map = set.to_header_map().unwrap();
        assert_eq!(map.get("x-gorgon").unwrap(), "g");
        assert_eq!(map.get("x-ss-stub").unwrap(), "S");
        assert_eq!(map.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_signer_reads_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("signer.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\ncat > /dev/null\necho '{\"x_ladon\":\"L-'\"$1\"'\"}'\n",
        )
        .unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let signer = CommandSigner::new(&script, SignerKind::Ladon, Duration::from_secs(5));
        let input = SignInput {
            params: "a=1".into(),
            timestamp: 1,
            cookies: None,
            body_hash: None,
        };
        let out = signer.sign(&input).await.unwrap();
        assert_eq!(out.x_ladon.as_deref(), Some("L-ladon"));
    }

    #[tokio::test]
    async fn test_command_signer_missing_program() {
        let signer = CommandSigner::new(
            Path::new("/nonexistent/signer-binary"),
            SignerKind::Argus,
            Duration::from_secs(1),
        );
        let input = SignInput {
            params: String::new(),
            timestamp: 0,
            cookies: None,
            body_hash: None,
        };
        let err = signer.sign(&input).await.unwrap_err();
        assert!(matches!(err, Error::Signature { ref signer, .. } if signer == "argus"));
    }
}
