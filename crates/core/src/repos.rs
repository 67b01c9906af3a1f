//! Typed collection handles.
//!
//! [`ClinicDb`] opens every collection the service uses against one
//! [`Store`] and is shared (`Arc`) by the services built on top of it. The
//! three branch patient collections mirror the per-location history
//! collections of the dashboard's database.

use clinic_store::{Collection, Store};
use clinic_types::Branch;

use crate::records::{
    ClosedDay, Followup, LabReport, LabReportNote, PatientRecord, PaymentRecord,
    PrescriptionImage, PrescriptionNote,
};
use crate::ClinicResult;

pub struct ClinicDb {
    bhayander: Collection<PatientRecord>,
    borivali: Collection<PatientRecord>,
    malad: Collection<PatientRecord>,
    pub payments: Collection<PaymentRecord>,
    pub closed_days: Collection<ClosedDay>,
    pub followups: Collection<Followup>,
    pub prescription_images: Collection<PrescriptionImage>,
    pub prescription_notes: Collection<PrescriptionNote>,
    pub lab_reports: Collection<LabReport>,
    pub lab_report_notes: Collection<LabReportNote>,
}

impl ClinicDb {
    /// Opens every collection under the given store.
    pub fn open(store: &Store) -> ClinicResult<Self> {
        Ok(Self {
            bhayander: store.collection("patients_history_bhayander")?,
            borivali: store.collection("patients_history_borivali")?,
            malad: store.collection("patients_history_malad")?,
            payments: store.collection("payment_record")?,
            closed_days: store.collection("closed_days")?,
            followups: store.collection("followups")?,
            prescription_images: store.collection("prescription_images")?,
            prescription_notes: store.collection("prescription_notes")?,
            lab_reports: store.collection("lab_reports")?,
            lab_report_notes: store.collection("lab_report_notes")?,
        })
    }

    /// The patient-history collection for a branch.
    pub fn patients(&self, branch: Branch) -> &Collection<PatientRecord> {
        match branch {
            Branch::Bhayander => &self.bhayander,
            Branch::Borivali => &self.borivali,
            Branch::Malad => &self.malad,
        }
    }
}
