pub mod error;
pub mod record;

pub use error::*;
pub use record::*;

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------- Scalar Tests --------------------

    #[test]
    fn test_write_and_read_back() {
        let mut rec = Record::new();
        rec.write("flag", true).unwrap();
        rec.write("count", 3i64).unwrap();
        rec.write("ratio", 0.5f64).unwrap();
        rec.write("name", "root").unwrap();
        rec.write("pos", (4.0, -2.0)).unwrap();

        assert!(rec.read_bool("flag", false).unwrap());
        assert_eq!(rec.read_int("count", 0).unwrap(), 3);
        assert_eq!(rec.read_float("ratio", 0.0).unwrap(), 0.5);
        assert_eq!(rec.read_str("name", "").unwrap(), "root");
        assert_eq!(rec.read_pair("pos", (0.0, 0.0)).unwrap(), (4.0, -2.0));
    }

    #[test]
    fn test_read_missing_returns_default() {
        let rec = Record::new();
        assert!(rec.read_bool("flag", true).unwrap());
        assert_eq!(rec.read_int("count", -1).unwrap(), -1);
        assert_eq!(rec.read_float("ratio", 0.5).unwrap(), 0.5);
        assert_eq!(rec.read_str("name", "fallback").unwrap(), "fallback");
        assert_eq!(rec.read_pair("pos", (1.0, 2.0)).unwrap(), (1.0, 2.0));
    }

    #[test]
    fn test_write_duplicate_rejected() {
        let mut rec = Record::new();
        rec.write("count", 1i64).unwrap();
        let err = rec.write("count", 2i64).unwrap_err();
        assert!(matches!(err, RecordError::DuplicateKey { .. }));
        // the first value survives
        assert_eq!(rec.read_int("count", 0).unwrap(), 1);
    }

    #[test]
    fn test_read_wrong_kind_rejected() {
        let mut rec = Record::new();
        rec.write("count", 3i64).unwrap();
        let err = rec.read_float("count", 0.0).unwrap_err();
        match err {
            RecordError::KindMismatch { key, expected, actual } => {
                assert_eq!(key, "count");
                assert_eq!(expected, FieldKind::Float);
                assert_eq!(actual, FieldKind::Int);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_int_and_float_stay_distinct() {
        let mut rec = Record::new();
        rec.write("int", 1i64).unwrap();
        rec.write("float", 1.0f64).unwrap();
        assert!(rec.read_int("float", 0).is_err());
        assert!(rec.read_float("int", 0.0).is_err());
    }

    #[test]
    fn test_pair_dimension_check() {
        let mut rec = Record::from_json_str(r#"{ "pos": [1.0, 2.0, 3.0] }"#).unwrap();
        let err = rec.read_pair("pos", (0.0, 0.0)).unwrap_err();
        assert!(matches!(err, RecordError::Invalid { .. }));
        assert!(err.to_string().contains("wrong tuple dimensions"));
        // the bad value does not poison unrelated keys
        assert!(rec.pop("interfaces").unwrap().is_none());
    }

    // -------------------- Container Tests --------------------

    #[test]
    fn test_push_pop_order() {
        let mut rec = Record::new();
        for i in 0..3i64 {
            rec.push("items").unwrap().write("index", i).unwrap();
        }
        for i in 0..3i64 {
            let entry = rec.pop("items").unwrap().unwrap();
            assert_eq!(entry.read_int("index", -1).unwrap(), i);
        }
        assert!(rec.pop("items").unwrap().is_none());
    }

    #[test]
    fn test_pop_missing_is_none() {
        let mut rec = Record::new();
        assert!(rec.pop("items").unwrap().is_none());
    }

    #[test]
    fn test_pop_wrong_kind_rejected() {
        let mut rec = Record::new();
        rec.write("items", 5i64).unwrap();
        assert!(matches!(
            rec.pop("items"),
            Err(RecordError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_sub_creates_and_reuses() {
        let mut rec = Record::new();
        rec.sub("median").unwrap().write("size", (3.0, 0.0)).unwrap();
        // second call reaches the same nested record
        let size = rec.sub("median").unwrap().read_pair("size", (0.0, 0.0)).unwrap();
        assert_eq!(size, (3.0, 0.0));
    }

    #[test]
    fn test_sub_wrong_kind_rejected() {
        let mut rec = Record::new();
        rec.write("median", "oops").unwrap();
        assert!(matches!(
            rec.sub("median"),
            Err(RecordError::KindMismatch { .. })
        ));
    }

    // -------------------- JSON Tests --------------------

    #[test]
    fn test_json_round_trip() {
        let mut rec = Record::new();
        rec.write("grid", 10.0f64).unwrap();
        rec.write("enabled", true).unwrap();
        rec.write("name", "deck").unwrap();
        let sub = rec.sub("median").unwrap();
        sub.write("size", (3.0, 256.0)).unwrap();
        for i in 0..2i64 {
            let entry = rec.push("interfaces").unwrap();
            entry.write("index", i).unwrap();
            entry.write("pos", (0.0, 0.0)).unwrap();
        }

        let text = rec.to_json_string().unwrap();
        let back = Record::from_json_str(&text).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_json_number_kinds_survive() {
        let mut rec = Record::from_json_str(r#"{ "int": 3, "float": 3.0 }"#).unwrap();
        assert_eq!(rec.read_int("int", 0).unwrap(), 3);
        assert_eq!(rec.read_float("float", 0.0).unwrap(), 3.0);
        assert!(rec.pop("missing").unwrap().is_none());
    }

    #[test]
    fn test_foreign_values_skipped() {
        let text = r#"{
            "grid": 10.0,
            "note": null,
            "mixed": [1, "two", {}],
            "nested": [[1, 2], [3, 4]]
        }"#;
        let rec = Record::from_json_str(text).unwrap();
        assert_eq!(rec.read_float("grid", 0.0).unwrap(), 10.0);
        assert!(!rec.contains("note"));
        assert!(!rec.contains("mixed"));
        assert!(!rec.contains("nested"));
    }

    #[test]
    fn test_parse_error_reported() {
        assert!(matches!(
            Record::from_json_str("{ not json"),
            Err(RecordError::Parse(_))
        ));
        assert!(matches!(
            Record::from_json_str("[1, 2]"),
            Err(RecordError::Invalid { .. })
        ));
    }

    #[test]
    fn test_error_prefix_names_path() {
        let err = RecordError::invalid("vertices", "shape not convex")
            .prefixed("interfaces[2]");
        assert_eq!(
            err.to_string(),
            "shape not convex at [interfaces[2].vertices]"
        );
    }

    #[test]
    fn test_empty_list_round_trips() {
        let mut rec = Record::from_json_str(r#"{ "interfaces": [] }"#).unwrap();
        assert!(rec.pop("interfaces").unwrap().is_none());
    }
}
