//! Modulo Dojo: single-page merchant onboarding sheet.

use super::{CompilerForm, FormKind, DOCUMENT_SECTIONS};
use crate::mail::MailEnvelope;
use crate::pdf::{FieldPlacement, FormLayout, FormValues, Rect, SignaturePlacement};
use crate::validation::ValidationErrors;

pub const TEMPLATE: &str = "moduloDojo.pdf";

pub struct DojoForm;

impl CompilerForm for DojoForm {
    fn kind(&self) -> FormKind {
        FormKind::Dojo
    }

    fn title(&self) -> &'static str {
        "Modulo Dojo"
    }

    fn default_layout(&self) -> FormLayout {
        let single = |name: &str, x: f32, y: f32, size: f32| FieldPlacement::single(name, 0, x, y, size);
        let address = |name: &str, y: f32| FieldPlacement::multiline(name, 0, 260.0, y, 20.0, 300.0, 18.0);

        FormLayout {
            template: TEMPLATE.to_string(),
            page_count: 1,
            fields: vec![
                single("partnermanager", 470.0, 1323.0, 21.0),
                single("emailpartnermanager", 470.0, 1290.0, 18.0),
                single("ragione", 310.0, 1170.0, 20.0),
                single("attualeGestore", 100.0, 880.0, 18.0),
                single("cell", 130.0, 1125.0, 20.0),
                single("email", 470.0, 1125.0, 20.0),
                single("iban", 125.0, 1080.0, 20.0),
                address("indirizzo", 1200.0),
                address("indirizzo2", 1030.0),
                address("indirizzo3", 1000.0),
                single("debito", 230.0, 813.0, 19.0),
                single("offdebito", 575.0, 813.0, 19.0),
                single("credito", 230.0, 850.0, 19.0),
                single("offcredito", 575.0, 850.0, 19.0),
                single("business", 230.0, 770.0, 19.0),
                single("offbusiness", 575.0, 770.0, 19.0),
                single("marchio", 190.0, 1240.0, 20.0),
                FieldPlacement::multiline("info", 0, 167.0, 340.0, 18.0, 590.0, 18.0),
                single("canone", 230.0, 730.0, 18.0),
                single("canonedojo", 575.0, 730.0, 18.0),
                FieldPlacement::flag("leadCanoneZero", 0, 590.0, 690.0, 16.0, "SI", "NO").defaulting_to(false),
                single("transatoCredito", 90.0, 590.0, 18.0),
                single("transatoDebito", 90.0, 510.0, 18.0),
                single("scontrinoMedio", 460.0, 590.0, 18.0),
                single("scontrinoMassimo", 460.0, 510.0, 18.0),
            ],
            blocks: Vec::new(),
            signatures: vec![
                SignaturePlacement::new("firmaCliente", 0, Rect::new(485.0, 105.0, 150.0, 50.0)),
                SignaturePlacement::new("firmaPartner", 0, Rect::new(85.0, 105.0, 150.0, 50.0)),
            ],
        }
    }

    fn download_filename(&self) -> &'static str {
        "modulo_compilato.pdf"
    }

    fn attachment_filename(&self) -> &'static str {
        "modulo.pdf"
    }

    fn sections(&self) -> &'static [&'static str] {
        DOCUMENT_SECTIONS
    }

    fn compose(&self, values: &FormValues) -> Result<MailEnvelope, ValidationErrors> {
        let mut messaggio = values.text("info");
        if let Some(mail) = values.non_blank("emailpartnermanager") {
            messaggio.push_str(&format!("\nEmail Partner Manager: {}", mail));
        }
        if let Some(gestore) = values.non_blank("attualeGestore") {
            messaggio.push_str(&format!("\nAttuale gestore: {}", gestore));
        }
        if values.flag("leadCanoneZero") == Some(true) {
            messaggio.push_str("\nLead canone zero 6 mesi: Sì");
        }
        let extra_addresses = ["indirizzo2", "indirizzo3"]
            .iter()
            .filter_map(|field| values.non_blank(field));
        for (index, address) in extra_addresses.enumerate() {
            messaggio.push_str(&format!("\nIndirizzo {}: {}", index + 2, address));
        }

        Ok(MailEnvelope {
            nome: values.non_blank("ragione").unwrap_or_else(|| "Senza nome".to_string()),
            email: values.non_blank("email").unwrap_or_else(|| "noreply@local".to_string()),
            telefono: values.non_blank("cell").unwrap_or_default(),
            messaggio,
            to: None,
            subject: None,
        })
    }
}
