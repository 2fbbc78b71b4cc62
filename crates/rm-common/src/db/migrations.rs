use tracing::{info, instrument};

use super::pool::PgPool;
use super::records::RecordStorageError;
use super::schema::{JOBS_DDL, MATCH_RESULTS_DDL, RESUMES_DDL};

/// Apply the schema. All statements are IF NOT EXISTS, so this is safe to
/// run on every startup.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), RecordStorageError> {
    let client = pool.get().await?;

    for ddl in [RESUMES_DDL, JOBS_DDL, MATCH_RESULTS_DDL] {
        client.batch_execute(ddl).await?;
    }

    info!("database schema ensured");
    Ok(())
}
