//! Diesel table definitions for the intelligence memory.
//!
//! Tables: intel_commits, intel_deployments, intel_incidents, intel_patterns.
//! Natural keys (sha, deployment_id, incident_id, pattern_type) carry unique
//! indexes; uniqueness is how at-most-one-writer is enforced.

diesel::table! {
    intel_commits (id) {
        id -> Int8,
        sha -> Varchar,
        repository -> Varchar,
        author -> Nullable<Varchar>,
        author_email -> Nullable<Varchar>,
        files_changed -> Int4,
        lines_added -> Int4,
        lines_deleted -> Int4,
        risk_score -> Float8,
        complexity_score -> Float8,
        blast_radius -> Int4,
        test_ratio -> Float8,
        commit_type -> Varchar,
        risky_patterns -> Jsonb,
        files -> Jsonb,
        prediction_details -> Nullable<Jsonb>,
        committed_at -> Timestamptz,
        analyzed_at -> Timestamptz,
    }
}

diesel::table! {
    intel_deployments (id) {
        id -> Int8,
        deployment_id -> Varchar,
        commit_sha -> Varchar,
        repository -> Varchar,
        deployed_at -> Timestamptz,
        predicted_risk -> Float8,
        predicted_impact -> Varchar,
        recommended_action -> Varchar,
        system_state -> Jsonb,
        resulted_in_incident -> Bool,
        incident_id -> Nullable<Varchar>,
    }
}

diesel::table! {
    intel_incidents (id) {
        id -> Int8,
        incident_id -> Varchar,
        severity -> Varchar,
        description -> Text,
        root_cause_commit -> Nullable<Varchar>,
        occurred_at -> Timestamptz,
        time_to_detect_minutes -> Nullable<Int4>,
        patterns -> Jsonb,
    }
}

diesel::table! {
    intel_patterns (id) {
        id -> Int8,
        pattern_type -> Varchar,
        description -> Text,
        occurrence_count -> Int4,
        incident_count -> Int4,
        confidence -> Float8,
        typical_impact -> Varchar,
        first_seen -> Timestamptz,
        last_seen -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    intel_commits,
    intel_deployments,
    intel_incidents,
    intel_patterns,
);
