//! E2SM-KPM v2 information elements
//!
//! Descriptors for the node and cell identifiers of the KPM v2 service model.
//! They are built once, on first use, and shared process-wide.
//!
//! # Usage Example
//!
//! ```rust
//! use e2per_asn1::codec;
//! use e2per_core::Value;
//! use e2per_servicemodels::kpm_v2;
//!
//! let kpm = kpm_v2::descriptors()?;
//! let bytes = codec::encode(&kpm.arp, &Value::Integer(15))?;
//! assert_eq!(&bytes[..], &[0x70]);
//! # Ok::<(), e2per_core::CodecError>(())
//! ```

use e2per_asn1::per::Constraint;
use e2per_asn1::schema::{Member, TypeDescriptor};
use e2per_core::CodecResult;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Upper bound of GNB-CU-UP-ID and GNB-DU-ID (2^36 - 1)
pub const MAX_GNB_UNIT_ID: i64 = 68_719_476_735;

/// Upper bound of SubscriptionID (2^32 - 1)
pub const MAX_SUBSCRIPTION_ID: i64 = 4_294_967_295;

/// KPM v2 type descriptors
#[derive(Debug)]
pub struct KpmV2Descriptors {
    /// PLMN-Identity ::= OCTET STRING (SIZE(3))
    pub plmn_identity: Arc<TypeDescriptor>,
    /// ARP ::= INTEGER (1..15, ...)
    pub arp: Arc<TypeDescriptor>,
    /// FiveQI ::= INTEGER (0..255, ...)
    pub five_qi: Arc<TypeDescriptor>,
    /// TimeStamp ::= OCTET STRING (SIZE(4))
    pub time_stamp: Arc<TypeDescriptor>,
    /// GNB-CU-UP-ID ::= INTEGER (0..68719476735)
    pub gnb_cu_up_id: Arc<TypeDescriptor>,
    /// GNB-DU-ID ::= INTEGER (0..68719476735)
    pub gnb_du_id: Arc<TypeDescriptor>,
    /// SubscriptionID ::= INTEGER (1..4294967295)
    pub subscription_id: Arc<TypeDescriptor>,
    /// NRCellIdentity ::= BIT STRING (SIZE(36))
    pub nr_cell_identity: Arc<TypeDescriptor>,
    /// EUTRACellIdentity ::= BIT STRING (SIZE(28))
    pub eutra_cell_identity: Arc<TypeDescriptor>,
    /// UE-Identity ::= OCTET STRING
    pub ue_identity: Arc<TypeDescriptor>,
    pub gnb_id_choice: Arc<TypeDescriptor>,
    pub global_gnb_id: Arc<TypeDescriptor>,
    pub global_kpm_node_gnb_id: Arc<TypeDescriptor>,
    pub enb_id_choice: Arc<TypeDescriptor>,
    pub enb_id: Arc<TypeDescriptor>,
    pub global_enb_id: Arc<TypeDescriptor>,
    pub global_kpm_node_enb_id: Arc<TypeDescriptor>,
    pub eutra_cgi: Arc<TypeDescriptor>,
    pub nr_cgi: Arc<TypeDescriptor>,
    pub ran_function_name: Arc<TypeDescriptor>,
}

static DESCRIPTORS: OnceCell<KpmV2Descriptors> = OnceCell::new();

/// Shared KPM v2 descriptors, built on first call
pub fn descriptors() -> CodecResult<&'static KpmV2Descriptors> {
    DESCRIPTORS.get_or_try_init(build)
}

fn build() -> CodecResult<KpmV2Descriptors> {
    let plmn_identity = TypeDescriptor::octet_string("PLMN-Identity", Some(Constraint::fixed(3)))?;
    let gnb_cu_up_id = TypeDescriptor::integer("GNB-CU-UP-ID", Constraint::range(0, MAX_GNB_UNIT_ID))?;
    let gnb_du_id = TypeDescriptor::integer("GNB-DU-ID", Constraint::range(0, MAX_GNB_UNIT_ID))?;
    let nr_cell_identity = TypeDescriptor::bit_string("NRCellIdentity", Some(Constraint::fixed(36)))?;
    let eutra_cell_identity = TypeDescriptor::bit_string("EUTRACellIdentity", Some(Constraint::fixed(28)))?;

    // GNB-ID-Choice ::= CHOICE { gnb-ID BIT STRING (SIZE(22..32)), ... }
    let gnb_id_choice = TypeDescriptor::choice("GNB-ID-Choice")
        .member(Member::new(
            "gnb-ID",
            TypeDescriptor::bit_string("GNB-ID", Some(Constraint::range(22, 32)))?,
        ))
        .extensible()
        .build()?;

    let global_gnb_id = TypeDescriptor::sequence("GlobalgNB-ID")
        .member(Member::new("plmn-id", &plmn_identity))
        .member(Member::new("gnb-id", &gnb_id_choice))
        .extensible()
        .build()?;

    let global_kpm_node_gnb_id = TypeDescriptor::sequence("GlobalKPMnode-gNB-ID")
        .member(Member::new("global-gNB-ID", &global_gnb_id))
        .member(Member::optional("gNB-CU-UP-ID", &gnb_cu_up_id))
        .member(Member::optional("gNB-DU-ID", &gnb_du_id))
        .extensible()
        .build()?;

    let macro_enb_id = TypeDescriptor::bit_string("Macro-eNB-ID", Some(Constraint::fixed(20)))?;
    let short_macro_enb_id = TypeDescriptor::bit_string("Short-Macro-eNB-ID", Some(Constraint::fixed(18)))?;
    let long_macro_enb_id = TypeDescriptor::bit_string("Long-Macro-eNB-ID", Some(Constraint::fixed(21)))?;

    let enb_id_choice = TypeDescriptor::choice("ENB-ID-Choice")
        .member(Member::new("enb-ID-macro", &macro_enb_id))
        .member(Member::new("enb-ID-shortmacro", &short_macro_enb_id))
        .member(Member::new("enb-ID-longmacro", &long_macro_enb_id))
        .extensible()
        .build()?;

    // ENB-ID ::= CHOICE { macro, home, ..., short-macro, long-macro }
    let enb_id = TypeDescriptor::choice("ENB-ID")
        .member(Member::new("macro-eNB-ID", &macro_enb_id))
        .member(Member::new(
            "home-eNB-ID",
            TypeDescriptor::bit_string("Home-eNB-ID", Some(Constraint::fixed(28)))?,
        ))
        .extensible()
        .member(Member::new("short-Macro-eNB-ID", &short_macro_enb_id))
        .member(Member::new("long-Macro-eNB-ID", &long_macro_enb_id))
        .build()?;

    let global_enb_id = TypeDescriptor::sequence("GlobalENB-ID")
        .member(Member::new("pLMN-Identity", &plmn_identity))
        .member(Member::new("eNB-ID", &enb_id))
        .extensible()
        .build()?;

    let global_kpm_node_enb_id = TypeDescriptor::sequence("GlobalKPMnode-eNB-ID")
        .member(Member::new("global-eNB-ID", &global_enb_id))
        .extensible()
        .build()?;

    let eutra_cgi = TypeDescriptor::sequence("EUTRACGI")
        .member(Member::new("pLMN-Identity", &plmn_identity))
        .member(Member::new("eUTRACellIdentity", &eutra_cell_identity))
        .extensible()
        .build()?;

    let nr_cgi = TypeDescriptor::sequence("NRCGI")
        .member(Member::new("pLMN-Identity", &plmn_identity))
        .member(Member::new("nRCellIdentity", &nr_cell_identity))
        .extensible()
        .build()?;

    let ran_function_name = TypeDescriptor::sequence("RANfunction-Name")
        .member(Member::new(
            "ranFunction-ShortName",
            TypeDescriptor::printable_string("RANfunction-ShortName", Some(Constraint::extensible(1, 150)))?,
        ))
        .member(Member::new(
            "ranFunction-E2SM-OID",
            TypeDescriptor::printable_string("RANfunction-E2SM-OID", Some(Constraint::extensible(1, 1000)))?,
        ))
        .member(Member::new(
            "ranFunction-Description",
            TypeDescriptor::printable_string("RANfunction-Description", Some(Constraint::extensible(1, 150)))?,
        ))
        .member(Member::optional(
            "ranFunction-Instance",
            TypeDescriptor::integer("RANfunction-Instance", Constraint::unconstrained())?,
        ))
        .extensible()
        .build()?;

    log::debug!("Built E2SM-KPM v2 descriptors");

    Ok(KpmV2Descriptors {
        arp: TypeDescriptor::integer("ARP", Constraint::extensible(1, 15))?,
        five_qi: TypeDescriptor::integer("FiveQI", Constraint::extensible(0, 255))?,
        time_stamp: TypeDescriptor::octet_string("TimeStamp", Some(Constraint::fixed(4)))?,
        subscription_id: TypeDescriptor::integer("SubscriptionID", Constraint::range(1, MAX_SUBSCRIPTION_ID))?,
        ue_identity: TypeDescriptor::octet_string("UE-Identity", None)?,
        plmn_identity,
        gnb_cu_up_id,
        gnb_du_id,
        nr_cell_identity,
        eutra_cell_identity,
        gnb_id_choice,
        global_gnb_id,
        global_kpm_node_gnb_id,
        enb_id_choice,
        enb_id,
        global_enb_id,
        global_kpm_node_enb_id,
        eutra_cgi,
        nr_cgi,
        ran_function_name,
    })
}
