use std::fs;

use anyhow::{Result, ensure};
use keycopy_config::CopyPolicy;
use keycopy_core::{
    CancelToken, Classification, CopyService, JobRequest, OutcomeKind, SAME_DIRECTORY_DETAIL,
    SkipReason, TreeWalker, classify,
};
use keycopy_telemetry::Metrics;
use keycopy_test_support::fixtures::{TempTree, mtime, set_mtime};
use keycopy_test_support::mocks::RecordingSink;

fn service(workers: usize) -> Result<CopyService> {
    Ok(CopyService::new(CopyPolicy { workers }, Metrics::new()?))
}

#[tokio::test]
async fn invoice_is_copied_and_unmatched_files_are_not_reported() -> Result<()> {
    let tree = TempTree::new()?;
    let invoice = tree.write_source("invoice_jan.txt", b"january totals")?;
    set_mtime(&invoice, 1_700_000_000)?;
    tree.write_source("report.txt", b"report")?;

    let request = JobRequest::new(["invoice"], tree.source(), tree.destination())?;
    let sink = RecordingSink::new();
    let summary = service(4)?.run(&request, &sink).await;

    assert_eq!(
        sink.outcomes(),
        [(
            OutcomeKind::Copied,
            "invoice_jan.txt (keyword: invoice)".to_string()
        )]
    );
    assert_eq!(sink.summaries().len(), 1);
    let (counts, aborted) = sink.summaries()[0];
    assert!(!aborted);
    assert_eq!((counts.copied, counts.updated, counts.skipped), (1, 0, 0));
    assert_eq!(summary.unmatched, 1);
    assert_eq!(sink.started(), [1]);
    assert_eq!(sink.discovered(), [2]);

    assert_eq!(tree.destination_files()?, ["invoice_jan.txt"]);
    let copied = tree.destination().join("invoice_jan.txt");
    assert_eq!(fs::read(&copied)?, b"january totals");
    assert_eq!(mtime(&copied)?, 1_700_000_000);
    Ok(())
}

#[tokio::test]
async fn newer_destination_is_left_untouched() -> Result<()> {
    let tree = TempTree::new()?;
    let source = tree.write_source("invoice_jan.txt", b"old source")?;
    let target = tree.write_destination("invoice_jan.txt", b"newer destination")?;
    set_mtime(&source, 1_000)?;
    set_mtime(&target, 2_000)?;

    let request = JobRequest::new(["invoice"], tree.source(), tree.destination())?;
    let sink = RecordingSink::new();
    let summary = service(2)?.run(&request, &sink).await;

    assert!(sink.outcomes().is_empty());
    assert_eq!(summary.skipped, 1);
    assert_eq!(fs::read(&target)?, b"newer destination");
    assert_eq!(mtime(&target)?, 2_000);
    Ok(())
}

#[tokio::test]
async fn older_destination_is_updated() -> Result<()> {
    let tree = TempTree::new()?;
    let source = tree.write_source("invoice_jan.txt", b"fresh")?;
    let target = tree.write_destination("invoice_jan.txt", b"stale")?;
    set_mtime(&source, 5_000)?;
    set_mtime(&target, 4_999)?;

    let request = JobRequest::new(["jan"], tree.source(), tree.destination())?;
    let sink = RecordingSink::new();
    let summary = service(2)?.run(&request, &sink).await;

    assert_eq!(sink.outcome_kinds(), [OutcomeKind::Updated]);
    assert_eq!(summary.updated, 1);
    assert_eq!(fs::read(&target)?, b"fresh");
    assert_eq!(mtime(&target)?, 5_000);
    Ok(())
}

#[tokio::test]
async fn hard_linked_file_is_skipped_as_same_file() -> Result<()> {
    let tree = TempTree::new()?;
    let source = tree.write_source("invoice_jan.txt", b"shared inode")?;
    let target = tree.destination().join("invoice_jan.txt");
    fs::hard_link(&source, &target)?;

    assert_eq!(
        classify(&source, &["invoice".to_string()], tree.destination())?,
        Classification::Skip {
            keyword: "invoice".to_string(),
            reason: SkipReason::SameFile,
        }
    );

    let request = JobRequest::new(["invoice"], tree.source(), tree.destination())?;
    let sink = RecordingSink::new();
    let summary = service(2)?.run(&request, &sink).await;
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed(), 1);
    assert!(sink.outcomes().is_empty());
    Ok(())
}

#[tokio::test]
async fn second_run_copies_nothing() -> Result<()> {
    let tree = TempTree::new()?;
    for index in 0..12 {
        tree.write_source(&format!("dir{}/invoice_{index}.txt", index % 3), b"data")?;
    }
    tree.write_source("notes.md", b"unrelated")?;
    let service = service(3)?;

    let first = JobRequest::new(["invoice"], tree.source(), tree.destination())?;
    let summary = service.run(&first, &RecordingSink::new()).await;
    assert_eq!(summary.copied, 12);

    let second = JobRequest::new(["invoice"], tree.source(), tree.destination())?;
    let sink = RecordingSink::new();
    let summary = service.run(&second, &sink).await;
    assert_eq!(summary.copied + summary.updated, 0);
    assert_eq!(summary.skipped, 12);
    assert!(sink.outcomes().is_empty());
    assert_eq!(sink.summaries().len(), 1);
    Ok(())
}

#[tokio::test]
async fn nested_destination_is_never_rescanned() -> Result<()> {
    let tree = TempTree::nested_destination()?;
    tree.write_source("invoice_a.txt", b"a")?;
    tree.write_source("deep/invoice_b.txt", b"b")?;
    tree.write_destination("invoice_stale.txt", b"already here")?;
    tree.write_destination("inner/invoice_inner.txt", b"inner")?;

    let walked: Vec<_> = TreeWalker::new(tree.source(), tree.destination(), CancelToken::new())
        .walk()
        .collect::<Result<_, _>>()?;
    ensure!(
        walked
            .iter()
            .all(|candidate| !candidate.path().starts_with(tree.destination())),
        "destination file surfaced as a candidate"
    );
    assert_eq!(walked.len(), 2);

    let request = JobRequest::new(["invoice"], tree.source(), tree.destination())?;
    let sink = RecordingSink::new();
    let summary = service(2)?.run(&request, &sink).await;
    assert_eq!(summary.copied, 2);
    assert_eq!(summary.processed(), 2);
    assert_eq!(
        tree.destination_files()?,
        ["invoice_a.txt", "invoice_b.txt", "invoice_stale.txt"]
    );
    Ok(())
}

#[test]
fn freshness_ties_favor_the_destination() -> Result<()> {
    let tree = TempTree::new()?;
    let keywords = ["invoice".to_string()];
    let cases = [(100, 99, true), (100, 100, false), (100, 101, false)];
    for (source_time, target_time, expect_update) in cases {
        let source = tree.write_source("invoice.txt", b"source")?;
        let target = tree.write_destination("invoice.txt", b"target")?;
        set_mtime(&source, source_time)?;
        set_mtime(&target, target_time)?;

        let first = classify(&source, &keywords, tree.destination())?;
        let second = classify(&source, &keywords, tree.destination())?;
        assert_eq!(first, second);
        if expect_update {
            assert!(matches!(first, Classification::Update { .. }));
        } else {
            assert!(matches!(
                first,
                Classification::Skip {
                    reason: SkipReason::NotNewer,
                    ..
                }
            ));
        }
        assert_eq!(fs::read(&target)?, b"target");
    }
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn source_aliasing_destination_is_rejected() -> Result<()> {
    let tree = TempTree::new()?;
    tree.write_destination("invoice.txt", b"x")?;
    let alias = tree.root().join("alias");
    std::os::unix::fs::symlink(tree.destination(), &alias)?;

    let request = JobRequest::new(["invoice"], &alias, tree.destination())?;
    let sink = RecordingSink::new();
    let summary = service(2)?.run(&request, &sink).await;

    assert!(summary.aborted);
    assert_eq!(summary.processed(), 0);
    assert_eq!(
        sink.outcomes(),
        [(OutcomeKind::Errored, SAME_DIRECTORY_DETAIL.to_string())]
    );
    assert_eq!(sink.summaries().len(), 1);
    assert!(sink.summaries()[0].1);
    assert!(sink.started().is_empty());
    Ok(())
}

#[tokio::test]
async fn cancellation_mid_batch_reports_aborted_and_leaves_complete_copies() -> Result<()> {
    const FILES: usize = 48;
    let tree = TempTree::new()?;
    let payload: Vec<u8> = (0..64 * 1024_u32).map(|i| (i % 251) as u8).collect();
    for index in 0..FILES {
        tree.write_source(&format!("invoice_{index:02}.bin"), &payload)?;
    }

    let request = JobRequest::new(["invoice"], tree.source(), tree.destination())?;
    let sink = RecordingSink::cancelling_after(3, request.cancel_token().clone());
    let summary = service(2)?.run(&request, &sink).await;

    assert!(summary.aborted);
    assert!(summary.processed() >= 3);
    assert!(summary.processed() <= FILES as u64);
    let summaries = sink.summaries();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].1);

    let written = tree.destination_files()?;
    assert!(written.len() < FILES, "cancellation did not stop dispatch");
    assert_eq!(
        written.len() as u64,
        summary.copied + summary.late_copies,
        "every file on disk is either reported or tallied as a late copy"
    );
    for name in written {
        assert_eq!(fs::read(tree.destination().join(&name))?, payload, "{name}");
    }
    Ok(())
}

#[tokio::test]
async fn per_file_failures_do_not_stop_the_job() -> Result<()> {
    let tree = TempTree::new()?;
    tree.write_source("invoice_ok.txt", b"ok")?;
    tree.write_source("invoice_blocked.txt", b"blocked")?;
    // An older directory at the target path makes the copy fail for this file only.
    let blocker = tree.destination().join("invoice_blocked.txt");
    fs::create_dir_all(&blocker)?;
    set_mtime(&blocker, 1_000)?;

    let request = JobRequest::new(["invoice"], tree.source(), tree.destination())?;
    let sink = RecordingSink::new();
    let summary = service(2)?.run(&request, &sink).await;

    assert!(!summary.aborted);
    assert_eq!(summary.copied, 1);
    assert_eq!(summary.errored, 1);
    let (counts, _) = sink.summaries()[0];
    assert_eq!(counts.total(), 1);
    let errors: Vec<_> = sink
        .outcomes()
        .into_iter()
        .filter(|(kind, _)| *kind == OutcomeKind::Errored)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.starts_with("invoice_blocked.txt: "));
    Ok(())
}
