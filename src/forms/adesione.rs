//! Modulo di adesione ExpoPay: two pages, company data on the first one,
//! contract date and customer signature on the second.

use super::{CompilerForm, FormKind, DOCUMENT_SECTIONS};
use crate::mail::MailEnvelope;
use crate::pdf::{FieldPlacement, FormLayout, FormValues, Rect, SignaturePlacement};
use crate::validation::{ValidationError, ValidationErrors};

pub const TEMPLATE: &str = "moduloadesionepartner.pdf";
const FILENAME: &str = "modulo_adesione_expopay.pdf";

pub struct AdesioneForm;

impl AdesioneForm {
    /// Partner manager mail first, company mail as fallback.
    pub fn recipient(values: &FormValues) -> Option<String> {
        values
            .non_blank("personaleManagerMail")
            .or_else(|| values.non_blank("mailAzienda"))
    }
}

impl CompilerForm for AdesioneForm {
    fn kind(&self) -> FormKind {
        FormKind::Adesione
    }

    fn title(&self) -> &'static str {
        "Modulo di adesione ExpoPay"
    }

    fn default_layout(&self) -> FormLayout {
        let text = |name: &str, x: f32, y: f32| FieldPlacement::single(name, 0, x, y, 11.0);
        let small = |name: &str, x: f32, y: f32, size: f32| FieldPlacement::single(name, 0, x, y, size);
        let wrapped =
            |name: &str, x: f32, y: f32, max_width: f32| FieldPlacement::multiline(name, 0, x, y, 11.0, max_width, 13.0);

        FormLayout {
            template: TEMPLATE.to_string(),
            page_count: 2,
            fields: vec![
                text("ragioneSociale", 155.0, 725.0),
                text("partitaIva", 125.0, 705.0),
                text("codiceSdi", 122.0, 683.0),
                text("sedeCommerciale", 165.0, 665.0),
                text("citta", 95.0, 645.0),
                text("cellulareAzienda", 120.0, 625.0),
                text("settoreMerceologico", 200.0, 605.0),
                text("codiceFiscaleAzienda", 370.0, 707.0),
                text("pec", 290.0, 683.0),
                text("provincia", 470.0, 645.0),
                text("mailAzienda", 300.0, 629.0),
                text("iban", 390.0, 605.0),
                text("legaleNomeCognome", 152.0, 526.0),
                text("legaleCodiceFiscale", 410.0, 525.0),
                wrapped("legaleIndirizzo", 170.0, 507.0, 260.0),
                small("legaleCellulare", 110.0, 485.0, 10.0),
                small("legaleMail", 320.0, 488.0, 10.0),
                wrapped("descrizioneServizio", 40.0, 410.0, 360.0),
                text("quantita", 410.0, 410.0),
                text("prezzo", 500.0, 410.0),
                small("personaleManagerNome", 80.0, 207.0, 9.0),
                small("personaleManagerMail", 52.0, 197.0, 9.0),
                small("personaleManagerCell", 65.0, 185.0, 9.0),
                text("totale", 390.0, 220.0),
                text("iva", 390.0, 205.0),
                text("trasporto", 410.0, 192.0),
                text("prezzoFinale", 420.0, 170.0).bold(),
                wrapped("note", 40.0, 110.0, 520.0),
                FieldPlacement::single("dataContratto", 1, 84.0, 120.0, 11.0),
            ],
            blocks: Vec::new(),
            signatures: vec![
                SignaturePlacement::new("firmaManager", 0, Rect::new(340.0, 150.0, 160.0, 45.0)),
                SignaturePlacement::new("firmaCliente", 1, Rect::new(380.0, 120.0, 180.0, 45.0)),
            ],
        }
    }

    fn download_filename(&self) -> &'static str {
        FILENAME
    }

    fn attachment_filename(&self) -> &'static str {
        FILENAME
    }

    fn sections(&self) -> &'static [&'static str] {
        DOCUMENT_SECTIONS
    }

    fn compose(&self, values: &FormValues) -> Result<MailEnvelope, ValidationErrors> {
        let recipient = Self::recipient(values).ok_or_else(|| {
            ValidationErrors::single(
                ValidationError::new("personaleManagerMail", "Nessun destinatario per il modulo")
                    .with_suggestion("Inserisci la mail azienda o la mail del Partner Manager"),
            )
        })?;

        let ragione_sociale = values.text("ragioneSociale");
        let note = values.text("note");
        let messaggio = if note.is_empty() {
            format!(
                "Modulo di adesione ExpoPay - servizio: {}",
                values.text("descrizioneServizio")
            )
        } else {
            note
        };
        let subject = format!(
            "Nuovo modulo adesione ExpoPay - {}",
            if ragione_sociale.is_empty() {
                "Senza ragione sociale"
            } else {
                ragione_sociale.as_str()
            }
        );

        Ok(MailEnvelope {
            nome: values.non_blank("ragioneSociale").unwrap_or_else(|| "Senza nome".to_string()),
            email: recipient.clone(),
            telefono: values.non_blank("cellulareAzienda").unwrap_or_default(),
            messaggio,
            to: Some(recipient),
            subject: Some(subject),
        })
    }
}
