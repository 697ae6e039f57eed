use super::args::{flag, parse_additional_args, remove_args_duplicate};
use super::request::DumpRequest;
use super::{BuildContext, DumpEngine, EngineKind};
use crate::error::Result;
use std::path::{Path, PathBuf};

pub const MARIADB_DUMP: &str = "mariadb-dump";

pub struct MariaDbDump {
    request: DumpRequest,
    program: PathBuf,
}

impl MariaDbDump {
    pub fn new(request: DumpRequest) -> Self {
        Self {
            request,
            program: PathBuf::from(MARIADB_DUMP),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl DumpEngine for MariaDbDump {
    fn kind(&self) -> EngineKind {
        EngineKind::MariaDb
    }

    fn program(&self) -> &Path {
        &self.program
    }

    fn request(&self) -> &DumpRequest {
        &self.request
    }

    fn validate(&self) -> Result<()> {
        self.request.connection.validate_required()
    }

    fn build_args(&self, _ctx: &BuildContext) -> Result<Vec<String>> {
        self.validate()?;
        let target = self.target();

        let mut args = vec![
            flag("host", &target.host),
            flag("port", target.port),
            flag("user", &target.username),
        ];

        if !target.password.is_empty() {
            args.push(flag("password", &target.password));
        }

        if let Some(extra) = self
            .request
            .additional_args
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            args.extend(parse_additional_args(extra));
        }

        let mut args = remove_args_duplicate(args);
        args.push(target.database);
        Ok(args)
    }

    fn extension(&self) -> Result<String> {
        Ok(".sql".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackupError;

    fn build(request: DumpRequest) -> Result<Vec<String>> {
        MariaDbDump::new(request).build_args(&BuildContext::new("backups"))
    }

    #[test]
    fn test_minimal_request() {
        let mut request = DumpRequest::new("admin", "app");
        request.additional_args = Some(String::new());

        let args = build(request).unwrap();
        assert_eq!(args, vec!["--host=127.0.0.1", "--port=3306", "--user=admin", "app"]);
    }

    #[test]
    fn test_password_flag_once() {
        let mut request = DumpRequest::new("admin", "app");
        request.connection.password = "s3cret".to_string();
        request.additional_args = Some("--password=s3cret --single-transaction".to_string());

        let args = build(request).unwrap();
        assert_eq!(args.iter().filter(|a| a.starts_with("--password=")).count(), 1);
        assert_eq!(args[3], "--password=s3cret");
        assert_eq!(args[4], "--single-transaction");
        assert_eq!(args.last().unwrap(), "app");
    }

    #[test]
    fn test_explicit_host_and_port() {
        let mut request = DumpRequest::new("admin", "app");
        request.connection.host = Some("db.internal".to_string());
        request.connection.port = Some(3307);

        let args = build(request).unwrap();
        assert_eq!(args[0], "--host=db.internal");
        assert_eq!(args[1], "--port=3307");
    }

    #[test]
    fn test_database_stays_positional_after_dedup() {
        let mut request = DumpRequest::new("admin", "app");
        request.additional_args = Some("--host=127.0.0.1 --routines".to_string());

        let args = build(request).unwrap();
        assert_eq!(
            args,
            vec!["--host=127.0.0.1", "--port=3306", "--user=admin", "--routines", "app"]
        );
    }

    #[test]
    fn test_missing_required() {
        assert!(matches!(
            build(DumpRequest::new("", "app")).unwrap_err(),
            BackupError::Validation(_)
        ));
        assert!(matches!(
            build(DumpRequest::new("admin", "")).unwrap_err(),
            BackupError::Validation(_)
        ));
    }

    #[test]
    fn test_no_env_overlay() {
        let mut request = DumpRequest::new("admin", "app");
        request.connection.password = "s3cret".to_string();
        assert!(MariaDbDump::new(request).env_overlay().is_empty());
    }
}
