//! Integration tests for pipeline execution.

#[cfg(test)]
mod tests {
    use crate::context::{
        CommandFailurePolicy, PartialOutputPolicy, RunContext, AFNI_DECONFLICT, OMP_NUM_THREADS,
    };
    use crate::core::StageStatus;
    use crate::errors::PipelineError;
    use crate::logging::{LogSession, Severity};
    use crate::pipeline::{ExistingOutputs, Pipeline, StageSpec};
    use crate::testing::{
        assert_logged, assert_not_logged, assert_stage_status, capture_logger, touch_all,
        RecordingRunner,
    };
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::{Path, PathBuf};

    const STRIP: &str = "3dSkullStrip -input head.nii.gz -prefix brain.nii.gz";

    struct Subject {
        _dir: tempfile::TempDir,
        head: PathBuf,
        brain: PathBuf,
        mask: PathBuf,
    }

    fn subject() -> Subject {
        let dir = tempfile::tempdir().unwrap();
        let head = dir.path().join("head.nii.gz");
        touch_all(&[&head]).unwrap();
        Subject {
            brain: dir.path().join("brain.nii.gz"),
            mask: dir.path().join("brain_mask.nii.gz"),
            head,
            _dir: dir,
        }
    }

    fn strip_pipeline(s: &Subject) -> Pipeline {
        Pipeline::new("anat")
            .stage(
                StageSpec::new("skullstrip")
                    .input(&s.head)
                    .outputs([&s.brain, &s.mask])
                    .command(STRIP),
            )
            .unwrap()
    }

    fn strip_runner(s: &Subject) -> RecordingRunner {
        RecordingRunner::new()
            .creating(STRIP, &s.brain)
            .creating(STRIP, &s.mask)
    }

    #[tokio::test]
    async fn test_second_run_skips_completed_stage() {
        let s = subject();
        let pipeline = strip_pipeline(&s);
        let runner = strip_runner(&s);
        let (logger, sink) = capture_logger();

        let first = pipeline.run(&RunContext::new(), &logger, &runner).await.unwrap();
        assert_stage_status(&first, "skullstrip", StageStatus::Ok);
        assert_eq!(runner.call_count(), 1);

        runner.reset();
        sink.clear();
        let second = pipeline.run(&RunContext::new(), &logger, &runner).await.unwrap();
        assert_stage_status(&second, "skullstrip", StageStatus::Skip);
        assert_eq!(runner.call_count(), 0);
        assert_eq!(second.commands_run(), 0);
        assert_logged(&sink, Severity::Warn, "Skipping 'skullstrip': outputs exist");
        assert_not_logged(&sink, Severity::Fatal);
    }

    #[tokio::test]
    async fn test_overwrite_reruns_completed_stage() {
        let s = subject();
        touch_all(&[&s.brain, &s.mask]).unwrap();
        let runner = RecordingRunner::new();
        let (logger, _) = capture_logger();

        let ctx = RunContext::new().with_overwrite(true);
        let report = strip_pipeline(&s).run(&ctx, &logger, &runner).await.unwrap();

        assert_stage_status(&report, "skullstrip", StageStatus::Ok);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].env.get(AFNI_DECONFLICT), Some("OVERWRITE"));
    }

    #[tokio::test]
    async fn test_missing_input_is_fatal_before_any_command() {
        let s = subject();
        fs::remove_file(&s.head).unwrap();
        let runner = RecordingRunner::new();
        let (logger, sink) = capture_logger();

        let err = strip_pipeline(&s)
            .run(&RunContext::new(), &logger, &runner)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Fatal(ref m) if m == "CHECK INPUTS"));
        assert_eq!(runner.call_count(), 0);
        assert_logged(&sink, Severity::Fatal, "CHECK INPUTS");
        assert_logged(
            &sink,
            Severity::Error,
            &format!("Input '{}' doesn't exist!", s.head.display()),
        );
        assert!(sink.of_severity(Severity::Command).is_empty());
    }

    #[tokio::test]
    async fn test_missing_input_fatal_reaches_both_log_files() {
        let s = subject();
        fs::remove_file(&s.head).unwrap();
        let log_dir = tempfile::tempdir().unwrap();
        let mut session = LogSession::new().without_console();
        let logger = session
            .attach_files(log_dir.path().join("logs").join("anat"), false, &Utc::now())
            .unwrap()
            .clone();
        let runner = RecordingRunner::new();

        let err = strip_pipeline(&s)
            .run(&RunContext::new(), &logger, &runner)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_ne!(err.exit_status(), 0);
        assert_eq!(runner.call_count(), 0);

        let files = session.files().unwrap();
        let text = fs::read_to_string(&files.text).unwrap();
        assert!(text
            .lines()
            .any(|l| l.starts_with("F, [") && l.contains("FATAL") && l.ends_with("CHECK INPUTS")));

        let json = fs::read_to_string(&files.json).unwrap();
        let fatal: Vec<serde_json::Value> = json
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .filter(|r: &serde_json::Value| r["level"] == "FATAL")
            .collect();
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0]["msg"], "CHECK INPUTS");
        assert_eq!(fatal[0]["level_id"], 7);
    }

    #[tokio::test]
    async fn test_existing_outputs_fatal_when_configured() {
        let s = subject();
        touch_all(&[&s.brain, &s.mask]).unwrap();
        let pipeline = Pipeline::new("anat")
            .stage(
                StageSpec::new("skullstrip")
                    .input(&s.head)
                    .outputs([&s.brain, &s.mask])
                    .command(STRIP)
                    .existing_outputs(ExistingOutputs::Fatal),
            )
            .unwrap();
        let runner = RecordingRunner::new();
        let (logger, sink) = capture_logger();

        let err = pipeline.run(&RunContext::new(), &logger, &runner).await.unwrap_err();
        assert!(matches!(err, PipelineError::Fatal(ref m) if m == "CHECK OUTPUTS"));
        assert_eq!(sink.of_severity(Severity::Error).len(), 2);
        assert_eq!(runner.call_count(), 0);

        let report = pipeline
            .run(&RunContext::new().with_overwrite(true), &logger, &runner)
            .await
            .unwrap();
        assert_stage_status(&report, "skullstrip", StageStatus::Ok);
    }

    #[tokio::test]
    async fn test_partial_outputs_rerun_with_warning() {
        let s = subject();
        touch_all(&[&s.brain]).unwrap();
        let runner = RecordingRunner::new();
        let (logger, sink) = capture_logger();

        let report = strip_pipeline(&s).run(&RunContext::new(), &logger, &runner).await.unwrap();

        assert_stage_status(&report, "skullstrip", StageStatus::Ok);
        assert_eq!(runner.call_count(), 1);
        let warns = sink.of_severity(Severity::Warn);
        assert_eq!(warns.len(), 1);
        assert!(warns[0].message.contains("1 of 2 outputs already exist"));
        assert!(warns[0].message.contains(&s.brain.display().to_string()));
    }

    #[tokio::test]
    async fn test_partial_outputs_abort() {
        let s = subject();
        touch_all(&[&s.mask]).unwrap();
        let runner = RecordingRunner::new();
        let (logger, sink) = capture_logger();
        let ctx = RunContext::new().with_partial_outputs(PartialOutputPolicy::Abort);

        let err = strip_pipeline(&s).run(&ctx, &logger, &runner).await.unwrap_err();

        assert!(matches!(err, PipelineError::Fatal(ref m) if m == "PARTIAL OUTPUTS"));
        assert_eq!(runner.call_count(), 0);
        assert_logged(
            &sink,
            Severity::Error,
            &format!("Output '{}' already exists.", s.mask.display()),
        );
    }

    fn two_stage_pipeline() -> Pipeline {
        Pipeline::new("func")
            .stage(
                StageSpec::new("motion")
                    .command("3dvolreg a")
                    .command("3dvolreg b")
                    .command("3dvolreg c"),
            )
            .unwrap()
            .stage(StageSpec::new("smooth").command("3dmerge"))
            .unwrap()
    }

    #[tokio::test]
    async fn test_failed_command_continues_by_default() {
        let runner = RecordingRunner::new().with_exit_code("3dvolreg b", 1);
        let (logger, sink) = capture_logger();

        let report = two_stage_pipeline()
            .run(&RunContext::new(), &logger, &runner)
            .await
            .unwrap();

        assert_eq!(runner.call_count(), 4);
        assert_stage_status(&report, "motion", StageStatus::Fail);
        assert_stage_status(&report, "smooth", StageStatus::Ok);
        assert_eq!(report.stage("motion").unwrap().failed_commands, vec!["3dvolreg b"]);
        assert!(!report.succeeded());
        assert_not_logged(&sink, Severity::Fatal);
    }

    #[tokio::test]
    async fn test_failed_command_aborts_stage() {
        let runner = RecordingRunner::new().with_exit_code("3dvolreg b", 1);
        let (logger, sink) = capture_logger();
        let ctx = RunContext::new().with_command_failure(CommandFailurePolicy::AbortStage);

        let report = two_stage_pipeline().run(&ctx, &logger, &runner).await.unwrap();

        assert_eq!(runner.commands(), vec!["3dvolreg a", "3dvolreg b", "3dmerge"]);
        assert_eq!(report.stage("motion").unwrap().commands_run, 2);
        assert_stage_status(&report, "motion", StageStatus::Fail);
        assert_stage_status(&report, "smooth", StageStatus::Ok);
        assert_logged(&sink, Severity::Warn, "Skipping 1 remaining command(s) of 'motion'");
    }

    #[tokio::test]
    async fn test_failed_command_aborts_pipeline() {
        let runner = RecordingRunner::new().with_exit_code("3dvolreg a", 2);
        let (logger, sink) = capture_logger();
        let ctx = RunContext::new().with_command_failure(CommandFailurePolicy::AbortPipeline);

        let err = two_stage_pipeline().run(&ctx, &logger, &runner).await.unwrap_err();

        assert!(matches!(err, PipelineError::Fatal(ref m) if m == "COMMAND FAILED"));
        assert_eq!(runner.commands(), vec!["3dvolreg a"]);
        assert_logged(&sink, Severity::Fatal, "COMMAND FAILED");
    }

    #[tokio::test]
    async fn test_stage_env_is_scoped() {
        let pipeline = Pipeline::new("func")
            .stage(StageSpec::new("first").command("a").env(OMP_NUM_THREADS, "1"))
            .unwrap()
            .stage(StageSpec::new("second").command("b"))
            .unwrap()
            .stage(StageSpec::new("third").command("c").env("FSLOUTPUTTYPE", "NIFTI"))
            .unwrap();
        let runner = RecordingRunner::new();
        let ctx = RunContext::new().with_threads(Some(8));

        pipeline.run(&ctx, &capture_logger().0, &runner).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].env.get(OMP_NUM_THREADS), Some("1"));
        assert_eq!(calls[1].env.get(OMP_NUM_THREADS), Some("8"));
        assert_eq!(calls[1].env.entry("FSLOUTPUTTYPE"), None);
        assert_eq!(calls[2].env.get("FSLOUTPUTTYPE"), Some("NIFTI"));
        assert_eq!(calls[2].env.get(OMP_NUM_THREADS), Some("8"));
    }

    #[tokio::test]
    async fn test_spawn_failure_propagates() {
        let runner = RecordingRunner::new().failing_to_spawn("3dvolreg a");
        let (logger, _) = capture_logger();

        let err = two_stage_pipeline()
            .run(&RunContext::new(), &logger, &runner)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Spawn { .. }));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_event_order_for_a_run() {
        let (logger, sink) = capture_logger();
        Pipeline::new("func")
            .stage(StageSpec::new("smooth").command("3dmerge"))
            .unwrap()
            .run(&RunContext::new(), &logger, &RecordingRunner::new())
            .await
            .unwrap();

        let seen: Vec<(Severity, String)> = sink
            .events()
            .into_iter()
            .map(|e| (e.severity, e.message))
            .collect();
        assert_eq!(seen[0], (Severity::Title, "func".to_string()));
        assert_eq!(seen[1].0, Severity::Debug);
        assert!(seen[1].1.starts_with("run context: "));
        assert_eq!(seen[2], (Severity::Title, "smooth".to_string()));
        assert_eq!(seen[3], (Severity::Command, "3dmerge".to_string()));
    }

    #[tokio::test]
    async fn test_blank_pipeline_name_is_rejected_before_logging() {
        let (logger, sink) = capture_logger();
        let err = Pipeline::new("")
            .run(&RunContext::new(), &logger, &RecordingRunner::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(sink.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_real_processes_run_once_then_skip() {
        use crate::process::ProcessRunner;

        let s = subject();
        let strip = format!(
            "cp '{}' '{}' && touch '{}'",
            s.head.display(),
            s.brain.display(),
            s.mask.display()
        );
        let pipeline = Pipeline::new("anat")
            .stage(
                StageSpec::new("skullstrip")
                    .input(&s.head)
                    .outputs([&s.brain, &s.mask])
                    .command(strip.as_str()),
            )
            .unwrap();
        let (logger, sink) = capture_logger();
        let runner = ProcessRunner::new();

        let first = pipeline.run(&RunContext::new(), &logger, &runner).await.unwrap();
        assert_eq!(first.commands_run(), 1);
        assert!(Path::new(&s.brain).exists());

        let second = pipeline.run(&RunContext::new(), &logger, &runner).await.unwrap();
        assert_eq!(second.commands_run(), 0);
        assert_eq!(sink.of_severity(Severity::Command).len(), 1);
    }
}
