// Payload framing: [version: u8][wincode payload].

use crate::error::PersistenceError;
use crate::models::{MetricFamily, Record};

pub(super) const BLOB_VERSION: u8 = 1;

pub(super) fn with_version_prefix(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

fn versioned_payload<'a>(
    bytes: &'a [u8],
    stream: &'static str,
) -> Result<&'a [u8], PersistenceError> {
    match bytes.split_first() {
        Some((&BLOB_VERSION, rest)) => Ok(rest),
        Some((v, _)) => Err(PersistenceError::Encode {
            stream,
            reason: format!("unknown blob version {v}"),
        }),
        None => Err(PersistenceError::Encode {
            stream,
            reason: "empty blob".into(),
        }),
    }
}

fn codec_err(stream: &'static str, e: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Encode {
        stream,
        reason: e.to_string(),
    }
}

pub(super) fn encode_record(record: &Record) -> Result<Vec<u8>, PersistenceError> {
    let stream = record.family().as_str();
    let payload = match record {
        Record::Cpu(r) => wincode::serialize(r),
        Record::Resources(r) => wincode::serialize(r),
        Record::Battery(r) => wincode::serialize(r),
        Record::FrameRate(r) => wincode::serialize(r),
        Record::Anr(r) => wincode::serialize(r),
    }
    .map_err(|e| codec_err(stream, e))?;
    Ok(with_version_prefix(BLOB_VERSION, payload))
}

pub(super) fn decode_record(family: MetricFamily, bytes: &[u8]) -> Result<Record, PersistenceError> {
    let stream = family.as_str();
    let payload = versioned_payload(bytes, stream)?;
    let record = match family {
        MetricFamily::Cpu => wincode::deserialize(payload).map(Record::Cpu),
        MetricFamily::Resources => wincode::deserialize(payload).map(Record::Resources),
        MetricFamily::Battery => wincode::deserialize(payload).map(Record::Battery),
        MetricFamily::FrameRate => wincode::deserialize(payload).map(Record::FrameRate),
        MetricFamily::Anr => wincode::deserialize(payload).map(Record::Anr),
    };
    record.map_err(|e| codec_err(stream, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FrameReading;

    #[test]
    fn prefix_is_checked_on_decode() {
        let blob = encode_record(&Record::FrameRate(FrameReading {
            timestamp: 7,
            fps: 58.5,
        }))
        .unwrap();
        assert_eq!(blob[0], BLOB_VERSION);

        let mut bad = blob.clone();
        bad[0] = 9;
        assert!(decode_record(MetricFamily::FrameRate, &bad).is_err());
        assert!(decode_record(MetricFamily::FrameRate, &[]).is_err());
    }
}
