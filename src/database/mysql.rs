use crate::dump::ConnectionTarget;
use crate::error::Result;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder};
use tracing::{debug, info};

fn opts(target: &ConnectionTarget) -> Opts {
    let password = (!target.password.is_empty()).then_some(target.password.as_str());

    OptsBuilder::default()
        .ip_or_hostname(&target.host)
        .tcp_port(target.port)
        .user(Some(&target.username))
        .pass(password)
        .db_name(Some(&target.database))
        .into()
}

pub async fn check_connectivity(target: &ConnectionTarget) -> Result<()> {
    info!("Testing MariaDB connection to {}:{}", target.host, target.port);
    let mut conn = Conn::new(opts(target)).await?;
    conn.query_drop("SELECT 1").await?;
    conn.disconnect().await?;
    debug!("MariaDB connection to database {} successful", target.database);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackupError;

    fn target(host: &str, port: u16) -> ConnectionTarget {
        ConnectionTarget {
            host: host.to_string(),
            port,
            username: "admin".to_string(),
            password: String::new(),
            database: "app".to_string(),
        }
    }

    #[test]
    fn test_opts_from_target() {
        let opts = opts(&target("db.internal", 3307));
        assert_eq!(opts.ip_or_hostname(), "db.internal");
        assert_eq!(opts.tcp_port(), 3307);
        assert_eq!(opts.user(), Some("admin"));
        assert_eq!(opts.pass(), None);
        assert_eq!(opts.db_name(), Some("app"));
    }

    #[tokio::test]
    async fn test_unreachable_is_connectivity_error() {
        let err = check_connectivity(&target("127.0.0.1", 1)).await.unwrap_err();
        assert!(matches!(err, BackupError::Connectivity(_)));
    }
}
