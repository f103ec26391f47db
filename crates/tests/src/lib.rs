//! # Integration Tests
//!
//! Integration and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots (error wording, serialized names)
//! - Config file -> registry -> dispatcher with mock engines
//! - Real process engines driven through fake binaries (unix)

#[cfg(test)]
mod contract_tests {
    use contracts::{
        AggregatedError, EngineError, EngineFailure, EngineKind, OperationKind, PdfA,
    };

    #[test]
    fn test_aggregated_error_wording() {
        let err = EngineError::from(AggregatedError::new(
            OperationKind::Merge,
            vec![
                EngineFailure {
                    engine: "qpdf".into(),
                    error: EngineError::backend("qpdf", OperationKind::Merge, "damaged xref"),
                },
                EngineFailure {
                    engine: "cairo".into(),
                    error: EngineError::not_supported("cairo", OperationKind::Merge),
                },
            ],
        ));
        let message = err.to_string();
        assert!(message.contains("damaged xref"));
        assert!(message.contains("engine 'cairo' does not support merge"));
        assert!(message.find("qpdf").unwrap() < message.find("cairo").unwrap());
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_value(OperationKind::RenderImage).unwrap(),
            "render_image"
        );
        assert_eq!(serde_json::to_value(EngineKind::Cad2X).unwrap(), "cad2x");
        assert_eq!(serde_json::to_value(PdfA::A1b).unwrap(), "PDF/A-1b");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{CancelReason, EngineError, EngineRequest, EngineResponse, OpContext};
    use dispatcher::{create_dispatcher, MultiPdfEngines};

    fn dispatcher_from_toml(content: &str) -> MultiPdfEngines {
        let blueprint = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        create_dispatcher(&blueprint, &[]).unwrap()
    }

    fn merge_request() -> EngineRequest {
        EngineRequest::Merge {
            input_paths: vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")],
            output_path: PathBuf::from("merged.pdf"),
        }
    }

    /// Unsupported, success and failure mixed: the success wins
    #[tokio::test]
    async fn test_e2e_first_success_wins() {
        let dispatcher = dispatcher_from_toml(
            r#"
[[engines]]
id = "nope"
kind = "mock"
[engines.params]
behavior = "unsupported"

[[engines]]
id = "good"
kind = "mock"
[engines.params]
behavior = "succeed"
delay_ms = "10"

[[engines]]
id = "bad"
kind = "mock"
[engines.params]
behavior = "fail:corrupt trailer"
"#,
        );

        let response = dispatcher
            .dispatch(&OpContext::new(), merge_request())
            .await
            .unwrap();
        assert_eq!(response, EngineResponse::Done);

        let metrics = dispatcher.metrics();
        let good = &metrics.iter().find(|(name, _)| name == "good").unwrap().1;
        assert_eq!(good.successes, 1);
    }

    /// Every engine fails: one cause per engine, in declaration order
    #[tokio::test]
    async fn test_e2e_all_engines_fail() {
        let dispatcher = dispatcher_from_toml(
            r#"
[[engines]]
id = "slow-fail"
kind = "mock"
[engines.params]
behavior = "fail:slow failure"
delay_ms = "30"

[[engines]]
id = "unsupported"
kind = "mock"
[engines.params]
behavior = "unsupported"

[[engines]]
id = "disabled"
kind = "mock"
enabled = false
"#,
        );

        let err = dispatcher
            .dispatch(&OpContext::new(), merge_request())
            .await
            .unwrap_err();
        let aggregated = err.aggregated().expect("aggregated error");
        let engines: Vec<_> = aggregated.iter().map(|f| f.engine.as_str()).collect();
        assert_eq!(engines, ["slow-fail", "unsupported"]);
        assert!(err.to_string().contains("slow failure"));
        assert!(aggregated.iter().nth(1).unwrap().error.is_not_supported());
    }

    /// Caller cancellation wins over engines that never finish
    #[tokio::test]
    async fn test_e2e_cancellation() {
        let dispatcher = dispatcher_from_toml(
            r#"
[dispatch]
timeout_secs = 0

[[engines]]
id = "stuck-1"
kind = "mock"
[engines.params]
behavior = "hang"

[[engines]]
id = "stuck-2"
kind = "mock"
[engines.params]
behavior = "hang"
"#,
        );

        let ctx = OpContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = dispatcher.dispatch(&ctx, merge_request()).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(
            err,
            EngineError::Cancelled {
                reason: CancelReason::Cancelled,
                ..
            }
        ));
    }

    /// The configured timeout bounds a request even when the caller sets none
    #[tokio::test]
    async fn test_e2e_configured_timeout() {
        let dispatcher = dispatcher_from_toml(
            r#"
[dispatch]
timeout_secs = 1

[[engines]]
id = "stuck"
kind = "mock"
[engines.params]
behavior = "hang"
"#,
        );

        let err = dispatcher
            .dispatch(&OpContext::new(), merge_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Cancelled {
                reason: CancelReason::DeadlineExceeded,
                ..
            }
        ));
    }

    /// read_metadata returns the winning engine's payload
    #[tokio::test]
    async fn test_e2e_read_metadata() {
        let dispatcher = dispatcher_from_toml(
            r#"
[[engines]]
id = "reader"
kind = "mock"
[engines.params]
"metadata.Title" = "Quarterly report"
"metadata.Pages" = "12"
"#,
        );

        let response = dispatcher
            .dispatch(
                &OpContext::new(),
                EngineRequest::ReadMetadata {
                    input_path: PathBuf::from("report.pdf"),
                },
            )
            .await
            .unwrap();
        let metadata = response.into_metadata().unwrap();
        assert_eq!(metadata["Title"], "Quarterly report");
        assert_eq!(metadata["Pages"], 12);
    }

    #[tokio::test]
    async fn test_e2e_config_file_with_engine_order() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[engines]]
id = "first"
kind = "mock"

[[engines]]
id = "second"
kind = "mock"
"#
        )
        .unwrap();

        let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();
        let dispatcher =
            create_dispatcher(&blueprint, &["second".to_string(), "first".to_string()]).unwrap();
        assert_eq!(dispatcher.engine_names(), ["second", "first"]);
    }

    #[cfg(unix)]
    mod process_engines {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        fn fake_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        /// qpdf merges while pdftocairo reports merge as unsupported
        #[tokio::test]
        async fn test_e2e_qpdf_merge_through_dispatcher() {
            let dir = tempfile::tempdir().unwrap();
            let qpdf = fake_binary(
                dir.path(),
                "qpdf",
                r#"printf '%s\n' "$@" > "$(dirname "$0")/args.txt""#,
            );
            let cairo = fake_binary(dir.path(), "pdftocairo", "exit 0");

            let dispatcher = dispatcher_from_toml(&format!(
                r#"
[[engines]]
id = "cairo"
kind = "pdftocairo"
bin_path = "{}"

[[engines]]
id = "qpdf"
kind = "qpdf"
bin_path = "{}"
"#,
                cairo.display(),
                qpdf.display()
            ));

            dispatcher
                .dispatch(&OpContext::new(), merge_request())
                .await
                .unwrap();

            let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
            let args: Vec<_> = args.lines().collect();
            assert_eq!(
                args,
                ["--empty", "--pages", "a.pdf", "b.pdf", "--", "merged.pdf"]
            );
        }

        /// A crashing binary's stderr shows up in the aggregated error
        #[tokio::test]
        async fn test_e2e_process_failure_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let qpdf = fake_binary(dir.path(), "qpdf", "echo 'not a PDF file' >&2\nexit 2");

            let dispatcher = dispatcher_from_toml(&format!(
                r#"
[[engines]]
id = "qpdf"
kind = "qpdf"
bin_path = "{}"

[[engines]]
id = "mock"
kind = "mock"
[engines.params]
behavior = "unsupported"
"#,
                qpdf.display()
            ));

            let err = dispatcher
                .dispatch(&OpContext::new(), merge_request())
                .await
                .unwrap_err();
            let aggregated = err.aggregated().expect("aggregated error");
            assert_eq!(aggregated.len(), 2);
            assert!(err.to_string().contains("not a PDF file"));
        }
    }
}
