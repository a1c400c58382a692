//! The set-dispatch algorithm shared by the TCP and UDP ingestion paths
//! (§4.3 "Decoding algorithm"): iterate sets, install templates, resolve
//! data sets against the live template cache, count faults without
//! halting.

use std::net::SocketAddr;

use log::debug;

use crate::codec::set::RawSet;
use crate::codec::{decode_data_records, Record};
use crate::registry::Registry;

use super::message::{DecodedDataSet, DecodedMessage};
use super::template_cache::{TemplateCache, TemplateDef};

/// Parses and dispatches every set in a message body, returning the
/// decoded message if it carried at least one successfully-decoded data
/// record. Template and options-template sets are always installed into
/// `cache` regardless of whether any data set follows them in the same
/// message.
#[allow(clippy::too_many_arguments)]
pub fn decode_frame_body(
    body: &[u8],
    remote: SocketAddr,
    export_time: u32,
    sequence_number: u32,
    observation_domain_id: u32,
    registry: &Registry,
    cache: &mut TemplateCache,
    metrics: &crate::metrics::PipelineMetrics,
) -> Option<DecodedMessage> {
    let mut rest = body;
    let mut sets = Vec::new();

    loop {
        let (next, raw_set) = match RawSet::decode(rest) {
            Ok(parsed) => parsed,
            Err(_) if rest.is_empty() => break,
            Err(_) => {
                metrics.record_protocol_error();
                break;
            }
        };
        rest = next;

        match raw_set {
            RawSet::Template(templates) => {
                for template in templates {
                    cache.insert(
                        remote,
                        observation_domain_id,
                        template.template_id,
                        TemplateDef::Template(template),
                    );
                }
            }
            RawSet::OptionsTemplate(templates) => {
                for template in templates {
                    cache.insert(
                        remote,
                        observation_domain_id,
                        template.template_id,
                        TemplateDef::OptionsTemplate(template),
                    );
                }
            }
            RawSet::RawData { set_id, body } => {
                match cache.get(remote, observation_domain_id, set_id) {
                    None => {
                        debug!(
                            "{remote}: data set {set_id} references a template not yet live, skipping"
                        );
                        metrics.record_unknown_template();
                    }
                    Some(def) => {
                        let fields = def.fields();
                        let fixed_len = def.fixed_record_length();
                        let (records, faults): (Vec<Record>, usize) =
                            decode_data_records(&body, &fields, fixed_len, registry);
                        for _ in 0..faults {
                            metrics.record_unknown_element();
                        }
                        metrics.records_decoded.fetch_add(
                            records.len() as u64,
                            std::sync::atomic::Ordering::Relaxed,
                        );
                        if !records.is_empty() {
                            sets.push(DecodedDataSet { set_id, records });
                        }
                    }
                }
            }
        }

        if rest.is_empty() {
            break;
        }
    }

    if sets.is_empty() {
        return None;
    }

    Some(DecodedMessage {
        remote,
        export_time,
        sequence_number,
        observation_domain_id,
        sets,
    })
}
