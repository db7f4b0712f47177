//! Discovery query matching.
//!
//! A profile matches iff every predicate the query actually specifies
//! holds. Unspecified predicates pass. AMF- and SMF-specific predicates
//! consult the profile's typed info variant.

use uuid::Uuid;

use crate::types::{Guami, NfProfile, NfType, PlmnId, Snssai, Tai};

#[derive(Debug, Clone, Default)]
pub struct DiscoveryQuery {
    pub target_nf_type: Option<NfType>,
    pub target_nf_instance_id: Option<Uuid>,
    pub requester_plmn: Option<PlmnId>,
    pub target_snssai_list: Vec<Snssai>,
    pub service_names: Vec<String>,
    pub amf_region_id: Option<String>,
    pub amf_set_id: Option<String>,
    pub guami: Option<Guami>,
    pub tai: Option<Tai>,
    pub dnn: Option<String>,
}

impl DiscoveryQuery {
    pub fn for_type(nf_type: NfType) -> Self {
        DiscoveryQuery {
            target_nf_type: Some(nf_type),
            ..Default::default()
        }
    }

    pub fn matches(&self, profile: &NfProfile) -> bool {
        if let Some(nf_type) = self.target_nf_type {
            if profile.nf_type != nf_type {
                return false;
            }
        }
        if let Some(id) = self.target_nf_instance_id {
            if profile.nf_instance_id != id {
                return false;
            }
        }
        // PLMN only constrains profiles that declare one.
        if let (Some(requester), Some(profile_plmn)) = (&self.requester_plmn, &profile.plmn_id) {
            if requester.mcc != profile_plmn.mcc || requester.mnc != profile_plmn.mnc {
                return false;
            }
        }
        if !self.target_snssai_list.is_empty() {
            let any = self
                .target_snssai_list
                .iter()
                .any(|q| profile.s_nssais.iter().any(|p| q.matches(p)));
            if !any {
                return false;
            }
        }
        if !self.service_names.is_empty() {
            let any = self.service_names.iter().any(|wanted| {
                profile
                    .nf_services
                    .iter()
                    .any(|svc| svc.service_name.eq_ignore_ascii_case(wanted))
            });
            if !any {
                return false;
            }
        }
        if self.target_nf_type == Some(NfType::Amf) && !self.amf_predicates(profile) {
            return false;
        }
        if self.target_nf_type == Some(NfType::Smf) && !self.smf_predicates(profile) {
            return false;
        }
        true
    }

    fn amf_predicates(&self, profile: &NfProfile) -> bool {
        let no_amf_predicates = self.amf_region_id.is_none()
            && self.amf_set_id.is_none()
            && self.guami.is_none()
            && self.tai.is_none();
        if no_amf_predicates {
            return true;
        }
        let Some(info) = profile.amf_info() else {
            return false;
        };
        if let Some(region) = &self.amf_region_id {
            if &info.amf_region_id != region {
                return false;
            }
        }
        if let Some(set) = &self.amf_set_id {
            if &info.amf_set_id != set {
                return false;
            }
        }
        if let Some(guami) = &self.guami {
            if !info.guami_list.contains(guami) {
                return false;
            }
        }
        if let Some(tai) = &self.tai {
            if !info.tai_list.contains(tai) {
                return false;
            }
        }
        true
    }

    fn smf_predicates(&self, profile: &NfProfile) -> bool {
        if self.dnn.is_none() && self.tai.is_none() {
            return true;
        }
        let Some(info) = profile.smf_info() else {
            return false;
        };
        if let Some(dnn) = &self.dnn {
            let supported = info
                .sm_info_list
                .iter()
                .any(|item| item.dnn_list.iter().any(|d| d == dnn));
            if !supported {
                return false;
            }
        }
        if let Some(tai) = &self.tai {
            if !info.tai_list.contains(tai) {
                return false;
            }
        }
        true
    }
}
