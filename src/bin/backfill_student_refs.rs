#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = literexia_api::run_student_ref_backfill().await {
        eprintln!("backfill-student-refs fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
