//! SQL schema for the canvass SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Written once at survey start; never updated.
CREATE TABLE IF NOT EXISTS surveys (
    survey_id     TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    full_name     TEXT NOT NULL,
    email         TEXT NOT NULL,
    company_token TEXT NOT NULL,
    role          TEXT NOT NULL,
    business_area TEXT NOT NULL,
    goals         TEXT NOT NULL DEFAULT '[]'   -- JSON array of strings
);

-- One row per survey; every UPDATE is guarded by `version`.
CREATE TABLE IF NOT EXISTS survey_progress (
    survey_id             TEXT PRIMARY KEY REFERENCES surveys(survey_id),
    current_question_id   TEXT NOT NULL,
    current_theme         TEXT NOT NULL,
    theme_sequence        TEXT NOT NULL,                -- JSON array
    completed_themes      TEXT NOT NULL DEFAULT '[]',   -- JSON array
    question_history      TEXT NOT NULL DEFAULT '[]',   -- JSON array
    theme_question_counts TEXT NOT NULL DEFAULT '{}',   -- JSON object
    total_question_count  INTEGER NOT NULL,
    completed             INTEGER NOT NULL DEFAULT 0,
    version               INTEGER NOT NULL DEFAULT 0,
    updated_at            TEXT NOT NULL
);

-- Responses are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS responses (
    response_id   TEXT PRIMARY KEY,
    survey_id     TEXT NOT NULL REFERENCES surveys(survey_id),
    question_id   TEXT NOT NULL,
    question_text TEXT NOT NULL,
    answer_json   TEXT NOT NULL,   -- the answer exactly as submitted
    theme         TEXT,
    recorded_at   TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS surveys_company_idx   ON surveys(company_token);
CREATE INDEX IF NOT EXISTS responses_survey_idx  ON responses(survey_id);

PRAGMA user_version = 1;
";
