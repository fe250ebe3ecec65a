//! Catalog migration registry
//!
//! The ordered list of schema-change units the shellac tooling runs.
//! Units are ordered so every table exists before anything references it.
//! Enumerated columns are plain VARCHAR; the allowed sets live in
//! [`super::types`] and are enforced at row decode, which keeps rows that
//! predate the sets readable.

use crate::error::DbResult;
use crate::migrations::{Migration, MigrationRegistry};

/// Build the catalog migration registry.
pub fn migrations() -> DbResult<MigrationRegistry> {
    MigrationRegistry::from_units(vec![
        Migration::new(
            "20240105_090000_create_stacks",
            "CREATE TABLE stacks (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                name VARCHAR NOT NULL,\n    \
                description TEXT\n\
            );",
            "DROP TABLE stacks;",
        ),
        Migration::new(
            "20240105_090100_create_formats",
            "CREATE TABLE formats (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                name VARCHAR NOT NULL,\n    \
                description TEXT,\n    \
                physical BOOLEAN NOT NULL\n\
            );",
            "DROP TABLE formats;",
        ),
        Migration::new(
            "20240105_090200_create_holding_groups",
            "CREATE TABLE holding_groups (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                album_title VARCHAR NOT NULL,\n    \
                album_artist VARCHAR NOT NULL,\n    \
                releasegroup_mbid UUID,\n    \
                description TEXT,\n    \
                active BOOLEAN NOT NULL DEFAULT true,\n    \
                stack_id UUID NOT NULL REFERENCES stacks (id)\n\
            );",
            "DROP TABLE holding_groups;",
        ),
        Migration::new(
            "20240105_090300_create_holdings",
            "CREATE TABLE holdings (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                label VARCHAR,\n    \
                releasegroup_mbid UUID,\n    \
                description TEXT,\n    \
                source_url VARCHAR,\n    \
                source_desc TEXT,\n    \
                torrent_hash VARCHAR UNIQUE,\n    \
                active BOOLEAN NOT NULL DEFAULT true,\n    \
                holding_group_id UUID NOT NULL REFERENCES holding_groups (id),\n    \
                format_id UUID NOT NULL REFERENCES formats (id)\n\
            );",
            "DROP TABLE holdings;",
        ),
        Migration::new(
            "20240105_090400_create_rotation_releases",
            "CREATE TABLE rotation_releases (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                start TIMESTAMPTZ NOT NULL,\n    \
                stop TIMESTAMPTZ,\n    \
                bin VARCHAR,\n    \
                holding_id UUID NOT NULL REFERENCES holdings (id)\n\
            );",
            "DROP TABLE rotation_releases;",
        ),
        Migration::new(
            "20240105_090500_create_holding_tags",
            "CREATE TABLE holding_tags (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                owner VARCHAR,\n    \
                tag VARCHAR NOT NULL,\n    \
                holding_id UUID NOT NULL REFERENCES holdings (id)\n\
            );",
            "DROP TABLE holding_tags;",
        ),
        Migration::new(
            "20240105_090600_create_holding_comments",
            "CREATE TABLE holding_comments (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                comment_text TEXT,\n    \
                reviewer_username VARCHAR,\n    \
                reviewer_fullname VARCHAR NOT NULL,\n    \
                rating INTEGER,\n    \
                review_date DATE,\n    \
                type VARCHAR,\n    \
                holding_id UUID NOT NULL REFERENCES holdings (id)\n\
            );",
            "DROP TABLE holding_comments;",
        ),
        Migration::new(
            "20240105_090700_create_tracks",
            "CREATE TABLE tracks (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                title VARCHAR NOT NULL,\n    \
                artist VARCHAR NOT NULL,\n    \
                file_path VARCHAR,\n    \
                track_num INTEGER NOT NULL,\n    \
                disc_number INTEGER NOT NULL DEFAULT 1,\n    \
                track_mbid UUID,\n    \
                recording_mbid UUID,\n    \
                has_fcc VARCHAR,\n    \
                holding_id UUID NOT NULL REFERENCES holdings (id)\n\
            );",
            "DROP TABLE tracks;",
        ),
        Migration::new(
            "20240105_090800_create_track_metadata",
            "CREATE TABLE track_metadata (\n    \
                id UUID PRIMARY KEY,\n    \
                added_by VARCHAR NOT NULL,\n    \
                added_at TIMESTAMPTZ NOT NULL,\n    \
                key VARCHAR NOT NULL,\n    \
                value TEXT NOT NULL,\n    \
                track_id UUID NOT NULL REFERENCES tracks (id)\n\
            );",
            "DROP TABLE track_metadata;",
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds() {
        let registry = migrations().unwrap();
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn tables_are_created_in_dependency_order() {
        let registry = migrations().unwrap();
        let ids: Vec<_> = registry.iter().map(|m| m.id.as_str()).collect();

        let pos = |name: &str| {
            ids.iter()
                .position(|id| id.ends_with(name))
                .unwrap_or_else(|| panic!("missing migration for {name}"))
        };

        assert!(pos("create_stacks") < pos("create_holding_groups"));
        assert!(pos("create_formats") < pos("create_holdings"));
        assert!(pos("create_holding_groups") < pos("create_holdings"));
        assert!(pos("create_holdings") < pos("create_rotation_releases"));
        assert!(pos("create_holdings") < pos("create_holding_comments"));
        assert!(pos("create_tracks") < pos("create_track_metadata"));
    }

    #[test]
    fn every_unit_is_reversible() {
        for unit in migrations().unwrap().iter() {
            assert!(unit.up_sql.contains("CREATE TABLE"), "{}", unit.id);
            assert!(unit.down_sql.contains("DROP TABLE"), "{}", unit.id);
            assert!(!unit.is_noop());
        }
    }

    #[test]
    fn audit_columns_on_every_table() {
        for unit in migrations().unwrap().iter() {
            assert!(unit.up_sql.contains("added_by VARCHAR NOT NULL"), "{}", unit.id);
            assert!(
                unit.up_sql.contains("added_at TIMESTAMPTZ NOT NULL"),
                "{}",
                unit.id
            );
        }
    }
}
