//! Fast-path heuristics for classifying content identifiers
//!
//! These are deliberately shallow prefix checks inherited from the network's
//! existing text conventions: any string starting with "Qm" passes
//! [`is_legacy_hash`], whether or not it decodes. Callers that need
//! certainty parse with [`Cid`] (see [`is_cid`]); callers on a hot path that
//! only need to route a string use the heuristics.

use cid::multibase::Base;
use cid::Cid;

/// dag-pb multicodec
const DAG_PB: u64 = 0x70;
/// dag-cbor multicodec
const DAG_CBOR: u64 = 0x71;
/// dag-json multicodec
const DAG_JSON: u64 = 0x0129;

/// Errors from content-id re-encoding
#[derive(Debug, thiserror::Error)]
pub enum ContentIdError {
    #[error("content id error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Does this string look like a legacy (base58 sha2-256) content hash?
pub fn is_legacy_hash(value: &str) -> bool {
    value.starts_with("Qm")
}

/// Does this string look like a v1 linked-data identifier?
///
/// Matches the two textual prefixes v1 identifiers render with: "zd"
/// (base58btc) and "ba" (base32).
pub fn is_linked_data_hash(value: &str) -> bool {
    value.starts_with("zd") || value.starts_with("ba")
}

/// Does this CID carry one of the dag-* structured-data codecs?
pub fn is_dag_cid(cid: &Cid) -> bool {
    matches!(cid.codec(), DAG_PB | DAG_CBOR | DAG_JSON)
}

/// Is this string a parseable CID (any version, any base)?
pub fn is_cid(value: &str) -> bool {
    Cid::try_from(value).is_ok()
}

/// Re-encode any CID as a v1 dag-cbor identifier in its canonical base32
/// text form
pub fn cid_to_hash(cid: &Cid) -> Result<String, ContentIdError> {
    let recoded = Cid::new_v1(DAG_CBOR, *cid.hash());
    Ok(recoded
        .to_string_of_base(Base::Base32Lower)
        .map_err(|e| anyhow::anyhow!("cid re-encode error: {}", e))?)
}

#[cfg(test)]
mod test {
    use super::*;

    const V0_TEXT: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
    const V1_TEXT: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

    #[test]
    fn test_legacy_prefix_heuristic() {
        assert!(is_legacy_hash(V0_TEXT));
        // Shallow by design: any "Qm" string passes
        assert!(is_legacy_hash("Qmnonsense"));
        assert!(!is_legacy_hash(V1_TEXT));
        assert!(!is_legacy_hash(""));
    }

    #[test]
    fn test_linked_data_prefix_heuristic() {
        assert!(is_linked_data_hash(V1_TEXT));
        assert!(is_linked_data_hash("zdpuAujL3noEMamveLPQWJPY6CYZHhHoskYQaZBvRbAfVwR8S"));
        assert!(!is_linked_data_hash(V0_TEXT));
    }

    #[test]
    fn test_is_cid_parses_both_versions() {
        assert!(is_cid(V0_TEXT));
        assert!(is_cid(V1_TEXT));
        assert!(!is_cid("Qmnonsense"));
    }

    #[test]
    fn test_cid_to_hash_recode() {
        let v0 = Cid::try_from(V0_TEXT).unwrap();
        let recoded = cid_to_hash(&v0).unwrap();

        assert!(recoded.starts_with("ba"));
        let parsed = Cid::try_from(recoded.as_str()).unwrap();
        assert_eq!(parsed.codec(), 0x71);
        assert_eq!(parsed.hash(), v0.hash());
    }

    #[test]
    fn test_dag_codec_check() {
        let v1 = Cid::try_from(V1_TEXT).unwrap();
        // bafybei... is dag-pb
        assert!(is_dag_cid(&v1));
    }
}
