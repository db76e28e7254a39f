pub const PRAGMAS: &str = r#"
PRAGMA foreign_keys = ON;
"#;

pub const SCHEMA: &str = r#"
-- feed table
CREATE TABLE IF NOT EXISTS feed (
    url TEXT NOT NULL,
    name TEXT,
    PRIMARY KEY (url)
);

-- headline table
CREATE TABLE IF NOT EXISTS headline (
    url TEXT NOT NULL,
    date TIMESTAMP NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    PRIMARY KEY (url, date, title),
    FOREIGN KEY (url) REFERENCES feed(url)
);

CREATE INDEX IF NOT EXISTS headline_date_index ON headline(date);
"#;

pub const INSERT_FEED: &str =
    "INSERT INTO feed (url, name) VALUES (?1, ?2) ON CONFLICT(url) DO NOTHING";

pub const INSERT_HEADLINE: &str =
    "INSERT INTO headline (url, date, title, description) VALUES (?1, ?2, ?3, ?4)";
