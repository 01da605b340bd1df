use std::env;

use pretty_env_logger::env_logger::DEFAULT_FILTER_ENV;

/// Info for everything. A bare `RUST_LOG=debug` (or `trace`) only raises
/// `crate_name`; any other value is read as regular env_logger directives.
pub fn logger_init(crate_name: &str) {
    let rust_log = env::var(DEFAULT_FILTER_ENV).ok();
    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&log_filters(crate_name, rust_log.as_deref()))
        .init();
}

fn log_filters(crate_name: &str, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim) {
        None | Some("") => format!("info,{}=info", crate_name),
        Some(level @ ("debug" | "trace")) => format!("info,{}={}", crate_name, level),
        Some(directives) => format!("info,{}", directives),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_only_raises_own_crate() {
        assert_eq!(log_filters("diet_table_rs", None), "info,diet_table_rs=info");
        assert_eq!(
            log_filters("diet_table_rs", Some("debug")),
            "info,diet_table_rs=debug"
        );
    }

    #[test]
    fn module_directives_are_kept() {
        assert_eq!(
            log_filters("diet_table_rs", Some("diet_table_rs=debug")),
            "info,diet_table_rs=debug"
        );
        assert_eq!(
            log_filters("diet_table_rs", Some("warn,reqwest=trace")),
            "info,warn,reqwest=trace"
        );
    }
}
