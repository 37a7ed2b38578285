use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::SearchError;

/// Domain used when a dork that needs one is rendered without it.
pub const DEFAULT_DOMAIN: &str = "example.com";

/// Number of `site:` alternatives emitted by [`Dork::ShowIps`].
const SHOW_IPS_SLOTS: usize = 30;

/// Predefined search templates for surfacing exposed content on a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dork {
    ExposedDocs,
    DirListing,
    ConfigFiles,
    DatabaseFiles,
    LogFiles,
    BackupFiles,
    LoginPages,
    SqlErrors,
    PhpErrors,
    Phpinfo,
    Pastebin,
    GithubGitlab,
    Stackoverflow,
    SignupPages,
    FindSubdomains,
    FindSubSubdomains,
    WaybackMachine,
    ShowIps,
}

const PASTE_SITES: &[&str] = &[
    "pastebin.com",
    "paste2.org",
    "pastehtml.com",
    "slexy.org",
    "snipplr.com",
    "snipt.net",
    "textsnip.com",
    "bitpaste.app",
    "justpaste.it",
    "heypasteit.com",
    "hastebin.com",
    "dpaste.org",
    "dpaste.com",
    "codepad.org",
    "jsitor.com",
    "codepen.io",
    "jsfiddle.net",
    "dotnetfiddle.net",
    "phpfiddle.org",
    "ide.geeksforgeeks.org",
    "repl.it",
    "ideone.com",
    "paste.debian.net",
    "paste.org",
    "paste.org.ru",
    "codebeautify.org",
    "codeshare.io",
    "trello.com",
];

const SQL_ERROR_STRINGS: &[&str] = &[
    "sql syntax near",
    "syntax error has occurred",
    "incorrect syntax near",
    "unexpected end of SQL command",
    "Warning: mysql_connect()",
    "Warning: mysql_query()",
    "Warning: pg_connect()",
];

impl Dork {
    pub const ALL: [Dork; 18] = [
        Dork::ExposedDocs,
        Dork::DirListing,
        Dork::ConfigFiles,
        Dork::DatabaseFiles,
        Dork::LogFiles,
        Dork::BackupFiles,
        Dork::LoginPages,
        Dork::SqlErrors,
        Dork::PhpErrors,
        Dork::Phpinfo,
        Dork::Pastebin,
        Dork::GithubGitlab,
        Dork::Stackoverflow,
        Dork::SignupPages,
        Dork::FindSubdomains,
        Dork::FindSubSubdomains,
        Dork::WaybackMachine,
        Dork::ShowIps,
    ];

    /// The identifier accepted on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Dork::ExposedDocs => "exposed_docs",
            Dork::DirListing => "dir_listing",
            Dork::ConfigFiles => "config_files",
            Dork::DatabaseFiles => "database_files",
            Dork::LogFiles => "log_files",
            Dork::BackupFiles => "backup_files",
            Dork::LoginPages => "login_pages",
            Dork::SqlErrors => "sql_errors",
            Dork::PhpErrors => "php_errors",
            Dork::Phpinfo => "phpinfo",
            Dork::Pastebin => "pastebin",
            Dork::GithubGitlab => "github_gitlab",
            Dork::Stackoverflow => "stackoverflow",
            Dork::SignupPages => "signup_pages",
            Dork::FindSubdomains => "find_subdomains",
            Dork::FindSubSubdomains => "find_sub_subdomains",
            Dork::WaybackMachine => "wayback_machine",
            Dork::ShowIps => "show_ips",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Dork::ExposedDocs => "Publicly exposed documents",
            Dork::DirListing => "Directory listing vulnerabilities",
            Dork::ConfigFiles => "Configuration files exposed",
            Dork::DatabaseFiles => "Database files exposed",
            Dork::LogFiles => "Log files exposed",
            Dork::BackupFiles => "Backup and old files",
            Dork::LoginPages => "Login pages",
            Dork::SqlErrors => "SQL errors",
            Dork::PhpErrors => "PHP errors / warning",
            Dork::Phpinfo => "phpinfo()",
            Dork::Pastebin => "Search pastebin.com / pasting sites",
            Dork::GithubGitlab => "Search github.com and gitlab.com",
            Dork::Stackoverflow => "Search stackoverflow.com",
            Dork::SignupPages => "Signup pages",
            Dork::FindSubdomains => "Find Subdomains",
            Dork::FindSubSubdomains => "Find Sub-Subdomains",
            Dork::WaybackMachine => "Search in Wayback Machine",
            Dork::ShowIps => "Show only IP addresses",
        }
    }

    /// Whether the rendered query depends on the target domain.
    pub fn uses_domain(self) -> bool {
        !matches!(self, Dork::Pastebin | Dork::GithubGitlab | Dork::Stackoverflow)
    }

    /// Render the template for `domain`, falling back to [`DEFAULT_DOMAIN`] when it is empty.
    pub fn render(self, domain: &str) -> String {
        let d = if domain.trim().is_empty() {
            DEFAULT_DOMAIN
        } else {
            domain.trim()
        };

        match self {
            Dork::ExposedDocs => format!(
                "site:{} {}",
                d,
                ext_any(&["doc", "docx", "odt", "rtf", "sxw", "psw", "ppt", "pptx", "pps", "csv"])
            ),
            Dork::DirListing => format!("site:{} intitle:index.of", d),
            Dork::ConfigFiles => format!(
                "site:{} {}",
                d,
                ext_any(&[
                    "xml", "conf", "cnf", "reg", "inf", "rdp", "cfg", "txt", "ora", "ini", "env",
                ])
            ),
            Dork::DatabaseFiles => format!("site:{} {}", d, ext_any(&["sql", "dbf", "mdb"])),
            Dork::LogFiles => format!("site:{} ext:log", d),
            Dork::BackupFiles => format!(
                "site:{} {}",
                d,
                ext_any(&["bkf", "bkp", "bak", "old", "backup"])
            ),
            Dork::LoginPages => format!(
                "site:{} inurl:login | inurl:signin | intitle:Login | intitle:'sign in' | inurl:auth",
                d
            ),
            Dork::SqlErrors => {
                let clauses: Vec<String> = SQL_ERROR_STRINGS
                    .iter()
                    .map(|s| format!("intext:'{}'", s))
                    .collect();
                format!("site:{} {}", d, clauses.join(" | "))
            }
            Dork::PhpErrors => format!(
                "site:{} 'PHP Parse error' | 'PHP Warning' | 'PHP Error'",
                d
            ),
            Dork::Phpinfo => format!(
                "site:{} ext:php intitle:phpinfo 'published by the PHP Group'",
                d
            ),
            Dork::Pastebin => PASTE_SITES
                .iter()
                .map(|site| format!("site:{}", site))
                .collect::<Vec<_>>()
                .join(" | "),
            Dork::GithubGitlab => "site:github.com | site:gitlab.com".to_string(),
            Dork::Stackoverflow => "site:stackoverflow.com".to_string(),
            Dork::SignupPages => format!(
                "site:{} inurl:signup | inurl:register | intitle:Signup",
                d
            ),
            Dork::FindSubdomains => format!("site:*.*.{}", d),
            Dork::FindSubSubdomains => format!("site:*.*.*.{}", d),
            Dork::WaybackMachine => format!("https://web.archive.org/web/*/{}./*", d),
            Dork::ShowIps => {
                // every slot carries the same domain; nothing here derives IP octets
                warn!(
                    "show_ips repeats '{}' into {} identical site: slots, no IP ranges are derived",
                    d, SHOW_IPS_SLOTS
                );
                let slots = vec![format!("site:*.*.{}.*", d); SHOW_IPS_SLOTS];
                format!("({}) ({} |)", d, slots.join(" | "))
            }
        }
    }
}

fn ext_any(extensions: &[&str]) -> String {
    extensions
        .iter()
        .map(|ext| format!("ext:{}", ext))
        .collect::<Vec<_>>()
        .join(" | ")
}

impl fmt::Display for Dork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dork {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dork::ALL
            .iter()
            .copied()
            .find(|dork| dork.key() == s)
            .ok_or_else(|| SearchError::UnknownDork(s.to_string()))
    }
}
