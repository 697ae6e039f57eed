use crate::dump::ConnectionTarget;
use crate::error::Result;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::{debug, info};

fn connect_options(target: &ConnectionTarget) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&target.host)
        .port(target.port)
        .username(&target.username)
        .database(&target.database);

    if target.password.is_empty() {
        options
    } else {
        options.password(&target.password)
    }
}

pub async fn check_connectivity(target: &ConnectionTarget) -> Result<()> {
    info!("Testing PostgreSQL connection to {}:{}", target.host, target.port);
    let mut conn = PgConnection::connect_with(&connect_options(target)).await?;
    sqlx::query("SELECT 1").execute(&mut conn).await?;
    conn.close().await?;
    debug!("PostgreSQL connection to database {} successful", target.database);
    Ok(())
}
