use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Verification64Vb,
    Cancellation,
    InsuranceApproval,
    Settlement,
    Endorsement,
    Proposal,
}

impl RequestKind {
    pub const ALL: [RequestKind; 6] = [
        Self::Verification64Vb,
        Self::Cancellation,
        Self::InsuranceApproval,
        Self::Settlement,
        Self::Endorsement,
        Self::Proposal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verification64Vb => "verification_64vb",
            Self::Cancellation => "cancellation",
            Self::InsuranceApproval => "insurance_approval",
            Self::Settlement => "settlement",
            Self::Endorsement => "endorsement",
            Self::Proposal => "proposal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "verification_64vb" | "64vb" | "verification" => Some(Self::Verification64Vb),
            "cancellation" => Some(Self::Cancellation),
            "insurance_approval" | "approval" => Some(Self::InsuranceApproval),
            "settlement" => Some(Self::Settlement),
            "endorsement" => Some(Self::Endorsement),
            "proposal" => Some(Self::Proposal),
            _ => None,
        }
    }

    /// Prefix of the `<prefix>Id` key in the integration receipt.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Verification64Vb => "verification",
            Self::Cancellation => "cancellation",
            Self::InsuranceApproval => "approval",
            Self::Settlement => "settlement",
            Self::Endorsement => "endorsement",
            Self::Proposal => "proposal",
        }
    }

    pub fn reference_code(&self) -> &'static str {
        match self {
            Self::Verification64Vb => "VRF",
            Self::Cancellation => "CAN",
            Self::InsuranceApproval => "APR",
            Self::Settlement => "STL",
            Self::Endorsement => "END",
            Self::Proposal => "PRP",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Verification64Vb => "64VB verification",
            Self::Cancellation => "cancellation",
            Self::InsuranceApproval => "insurance approval",
            Self::Settlement => "settlement",
            Self::Endorsement => "endorsement",
            Self::Proposal => "proposal",
        }
    }

    pub fn next_steps(&self) -> &'static [&'static str] {
        match self {
            Self::Verification64Vb => &[
                "Insurer will confirm premium realisation within 2 working days",
                "Policy risk commences once 64VB compliance is confirmed",
                "Track verification status from the requests dashboard",
            ],
            Self::Cancellation => &[
                "Insurer will review the cancellation request",
                "Refund will be processed to the selected refund mode within 7 working days",
                "Cancellation endorsement will be shared with the customer by email",
            ],
            Self::InsuranceApproval => &[
                "Underwriting decision has been recorded with the insurer",
                "Approved proposals move to policy issuance",
                "Referred cases will be picked up by the named underwriter",
            ],
            Self::Settlement => &[
                "Claim settlement is queued for insurer approval",
                "Payment will be released to the payee account after approval",
                "Settlement letter will be issued to the customer",
            ],
            Self::Endorsement => &[
                "Insurer will validate the endorsement details",
                "Premium difference, if any, must be collected before issuance",
                "Endorsement schedule will be shared with the customer",
            ],
            Self::Proposal => &[
                "Insurer will review the proposal and risk details",
                "Payment link will be sent to the customer once the quote is approved",
                "Policy document will be issued after premium realisation",
            ],
        }
    }
}
