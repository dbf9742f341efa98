use std::io::Write;

use eth_graph_loader::loader::read_records;
use eth_graph_loader::FieldValue;
use proptest::prelude::*;
use tempfile::NamedTempFile;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn well_formed_file_yields_every_row_in_order(
        rows in prop::collection::vec(("0x[0-9a-f]{1,40}", "[a-z]{1,12}"), 0..50)
    ) {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "addressId,type").unwrap();
        for (id, kind) in &rows {
            writeln!(file, "{},{}", id, kind).unwrap();
        }
        file.flush().unwrap();

        let records = read_records(file.path()).unwrap();

        prop_assert_eq!(records.len(), rows.len());
        for (record, (id, kind)) in records.iter().zip(&rows) {
            prop_assert_eq!(&record["addressId"], &FieldValue::Text(id.clone()));
            prop_assert_eq!(&record["type"], &FieldValue::Text(kind.clone()));
        }
    }
}
