//! End-to-end tests of the CSV to multiAttest pipeline against an in-memory registry

use std::io::Write;
use std::sync::Mutex;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, TxHash, B256};
use async_trait::async_trait;
use tempfile::NamedTempFile;

use eas_batch_attester::prelude::*;
use eas_batch_attester::schema::SchemaEncoder;
use eas_batch_attester::service::prepare_requests;
use eas_batch_attester::submitter::gas_limit_with_margin;

const ALICE: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const BOB: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const CAROL: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

#[derive(Debug, Clone)]
struct SentTransaction {
    schema: B256,
    recipients: Vec<Address>,
    nonce: u64,
    gas_limit: u64,
}

struct MockRegistry {
    nonce: u64,
    estimate: u64,
    estimates: Mutex<Vec<usize>>,
    sent: Mutex<Vec<SentTransaction>>,
}

impl MockRegistry {
    fn new(nonce: u64, estimate: u64) -> Self {
        Self {
            nonce,
            estimate,
            estimates: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<SentTransaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttestationRegistry for MockRegistry {
    async fn account_nonce(&self) -> Result<u64> {
        Ok(self.nonce)
    }

    async fn estimate_gas(&self, _schema: B256, requests: &[AttestationRequest]) -> Result<u64> {
        self.estimates.lock().unwrap().push(requests.len());
        Ok(self.estimate)
    }

    async fn submit(
        &self,
        schema: B256,
        requests: &[AttestationRequest],
        nonce: u64,
        gas_limit: u64,
    ) -> Result<TxHash> {
        self.sent.lock().unwrap().push(SentTransaction {
            schema,
            recipients: requests.iter().map(|r| r.recipient).collect(),
            nonce,
            gas_limit,
        });
        Ok(TxHash::with_last_byte(nonce as u8))
    }
}

fn csv_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

fn config_for(file: &NamedTempFile, max_batch: usize) -> AttestConfig {
    let mut config = AttestConfig::default();
    config.input.csv_path = file.path().to_path_buf();
    config.batch.max_batch = max_batch;
    config
}

#[tokio::test]
async fn two_rows_fit_one_batch() {
    let file = csv_file(&[&format!("{},true", ALICE), &format!("{},false", BOB)]);
    let config = config_for(&file, 2);

    let service = AttestationService::new(&config, MockRegistry::new(12, 80_000)).unwrap();
    let requests = service.prepare(file.path()).unwrap();

    let encoder = SchemaEncoder::new("bool isHuman").unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].recipient, ALICE.parse::<Address>().unwrap());
    assert_eq!(requests[1].recipient, BOB.parse::<Address>().unwrap());
    assert_eq!(requests[0].data, encoder.encode(&encoder.items(&["true"])).unwrap());
    assert_eq!(requests[1].data, encoder.encode(&encoder.items(&["false"])).unwrap());
    for request in &requests {
        assert!(request.revocable);
        assert_eq!(request.expiration_time, 0);
        assert!(request.value.is_zero());
        assert_eq!(request.ref_uid, B256::ZERO);
    }

    let report = service.submit(&requests).await.unwrap();

    assert_eq!(report.batches.len(), 1);
    let sent = service.registry().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].nonce, 12);
    assert_eq!(sent[0].schema, config.registry.schema_uid);
    assert_eq!(
        sent[0].recipients,
        vec![ALICE.parse::<Address>().unwrap(), BOB.parse::<Address>().unwrap()]
    );
}

#[tokio::test]
async fn three_rows_make_two_batches_with_consecutive_nonces() {
    let file = csv_file(&[
        &format!("{},true", ALICE),
        &format!("{},false", BOB),
        &format!("{},true", CAROL),
    ]);
    let config = config_for(&file, 2);

    let service = AttestationService::new(&config, MockRegistry::new(100, 90_000)).unwrap();
    let requests = prepare_requests(&config).unwrap();
    let report = service.submit(&requests).await.unwrap();

    let sizes: Vec<usize> = report.batches.iter().map(|b| b.size).collect();
    assert_eq!(sizes, vec![2, 1]);

    let sent = service.registry().sent();
    let nonces: Vec<u64> = sent.iter().map(|tx| tx.nonce).collect();
    assert_eq!(nonces, vec![100, 101]);

    let expected_gas = gas_limit_with_margin(90_000, 15);
    assert_eq!(expected_gas, 103_500);
    assert!(sent.iter().all(|tx| tx.gas_limit == expected_gas));
    assert_eq!(*service.registry().estimates.lock().unwrap(), vec![2]);

    assert_eq!(report.tx_hashes().len(), 2);
    assert_eq!(report.batches[1].first_row, 3);
    assert_eq!(report.batches[1].last_row, 3);
}

#[tokio::test]
async fn malformed_row_submits_nothing() {
    let file = csv_file(&[
        &format!("{},true", ALICE),
        BOB,
        &format!("{},true", CAROL),
    ]);
    let config = config_for(&file, 2);

    let service = AttestationService::new(&config, MockRegistry::new(0, 1)).unwrap();

    let result = service.prepare(file.path());
    match result {
        Err(AttestError::Validation { first_line, .. }) => assert_eq!(first_line, 2),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(service.registry().sent().is_empty());
    assert!(service.registry().estimates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn quoted_fields_with_commas_are_encoded() {
    let file = csv_file(&[
        &format!("{},\"Doe, Jane\",42", ALICE),
        &format!("\"{}\",plain,7", BOB),
    ]);
    let mut config = config_for(&file, 5);
    config.registry.schema = "string name, uint8 level".to_string();

    let service = AttestationService::new(&config, MockRegistry::new(0, 1)).unwrap();
    let requests = service.prepare(file.path()).unwrap();

    let encoder = service.encoder();
    assert_eq!(
        requests[0].data,
        encoder.encode(&encoder.items(&["Doe, Jane", "42"])).unwrap()
    );
    assert_eq!(requests[1].recipient, BOB.parse::<Address>().unwrap());
}

#[tokio::test]
async fn blank_line_between_rows_submits_nothing() {
    let file = csv_file(&[&format!("{},true", ALICE), "", &format!("{},false", BOB)]);
    let config = config_for(&file, 2);

    let service = AttestationService::new(&config, MockRegistry::new(0, 1)).unwrap();

    match service.prepare(file.path()) {
        Err(AttestError::Validation { first_line, .. }) => assert_eq!(first_line, 2),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(service.registry().sent().is_empty());
}

#[tokio::test]
async fn quoted_string_keeps_padding() {
    let file = csv_file(&[&format!("{} , \"  padded  \"", ALICE)]);
    let mut config = config_for(&file, 2);
    config.registry.schema = "string note".to_string();

    let service = AttestationService::new(&config, MockRegistry::new(0, 1)).unwrap();
    let requests = service.prepare(file.path()).unwrap();

    let expected = DynSolValue::Tuple(vec![DynSolValue::String("  padded  ".into())]);
    assert_eq!(requests[0].recipient, ALICE.parse::<Address>().unwrap());
    assert_eq!(requests[0].data.to_vec(), expected.abi_encode_params());
}

#[tokio::test]
async fn empty_file_sends_nothing() {
    let file = csv_file(&[]);
    let config = config_for(&file, 2);

    let service = AttestationService::new(&config, MockRegistry::new(5, 1)).unwrap();
    let requests = service.prepare(file.path()).unwrap();
    assert!(requests.is_empty());

    let report = service.submit(&requests).await.unwrap();
    assert!(report.batches.is_empty());
    assert!(service.estimate(&requests).await.unwrap().is_none());
    assert!(service.registry().sent().is_empty());
}

#[tokio::test]
async fn estimate_uses_first_batch() {
    let file = csv_file(&[
        &format!("{},true", ALICE),
        &format!("{},false", BOB),
        &format!("{},true", CAROL),
    ]);
    let config = config_for(&file, 2);

    let service = AttestationService::new(&config, MockRegistry::new(0, 200_001)).unwrap();
    let requests = service.prepare(file.path()).unwrap();
    let estimate = service.estimate(&requests).await.unwrap().unwrap();

    assert_eq!(estimate.batch_size, 2);
    assert_eq!(estimate.estimate, 200_001);
    assert_eq!(estimate.gas_limit, 230_002);
    assert!(service.registry().sent().is_empty());
}
