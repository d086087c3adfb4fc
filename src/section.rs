//! Documentation sections of the nursing-sheet editor.
//!
//! Selecting a section is a read-only operation: the editor view is built
//! from whatever is persisted and never writes back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::Store;
use crate::error::{Error, Result};
use crate::models::{
    CatalogFilter, CatheterRecord, IvTherapy, MedicationAdministration, NursingSheet, Patient,
    ProductoServicio, Stay, VitalSignReading,
};

/// The nine sections of a nursing sheet, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Signos,
    Medicamentos,
    TerapiaIv,
    Estudios,
    Sondas,
    Liquidos,
    Dieta,
    Observaciones,
    Graficas,
}

impl Section {
    pub const ALL: [Section; 9] = [
        Section::Signos,
        Section::Medicamentos,
        Section::TerapiaIv,
        Section::Estudios,
        Section::Sondas,
        Section::Liquidos,
        Section::Dieta,
        Section::Observaciones,
        Section::Graficas,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Section::Signos => "signos",
            Section::Medicamentos => "medicamentos",
            Section::TerapiaIv => "terapia_iv",
            Section::Estudios => "estudios",
            Section::Sondas => "sondas",
            Section::Liquidos => "liquidos",
            Section::Dieta => "dieta",
            Section::Observaciones => "observaciones",
            Section::Graficas => "graficas",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Signos => "Tomar Signos",
            Section::Medicamentos => "Ministración de Medicamentos",
            Section::TerapiaIv => "Terapia Intravenosa",
            Section::Estudios => "Ordenar Estudios",
            Section::Sondas => "Sondas y Catéteres",
            Section::Liquidos => "Control de Líquidos",
            Section::Dieta => "Dieta",
            Section::Observaciones => "Observaciones",
            Section::Graficas => "Gráficas",
        }
    }

    /// Sections with no editor yet. They still appear as tabs.
    pub fn is_available(&self) -> bool {
        !matches!(
            self,
            Section::Estudios | Section::Liquidos | Section::Dieta
        )
    }

    /// Whether the section accepts writes at all (charts are derived).
    pub fn is_writable(&self) -> bool {
        self.is_available() && *self != Section::Graficas
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Section {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.id() == s)
            .ok_or_else(|| Error::validation("seccion", format!("unknown section '{}'", s)))
    }
}

/// Tab entry listed in every editor view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionTab {
    pub id: Section,
    pub label: String,
    pub disponible: bool,
}

/// Content of the active section, one variant per section kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tipo", content = "datos", rename_all = "snake_case")]
pub enum SectionContent {
    Signos {
        lecturas: Vec<VitalSignReading>,
    },
    Medicamentos {
        registros: Vec<MedicationAdministration>,
        catalogo: Vec<ProductoServicio>,
    },
    TerapiaIv {
        registros: Vec<IvTherapy>,
        soluciones: Vec<ProductoServicio>,
    },
    Sondas {
        registros: Vec<CatheterRecord>,
    },
    Observaciones {
        texto: String,
    },
    Graficas {
        series: Vec<ChartSeries>,
    },
    NoDisponible,
}

/// The active section as rendered for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionView {
    pub seccion: Section,
    pub label: String,
    /// False once the sheet is closed or when the section takes no input.
    pub editable: bool,
    pub contenido: SectionContent,
}

/// Full body of `GET /hojasenfermerias/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetEditorView {
    pub paciente: Patient,
    pub estancia: Stay,
    pub hoja: NursingSheet,
    pub secciones: Vec<SectionTab>,
    pub activa: SectionView,
}

/// One plotted vital sign over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub signo: String,
    pub puntos: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub fecha_hora: DateTime<Utc>,
    pub valor: f64,
}

/// Builds the chart series from vital-sign readings, oldest first. Series
/// with no points are omitted.
pub fn chart_series(readings: &[VitalSignReading]) -> Vec<ChartSeries> {
    type Extract = fn(&VitalSignReading) -> Option<f64>;
    let metrics: [(&str, Extract); 7] = [
        ("tension_arterial_sistolica", |r| {
            r.mediciones.tension_arterial_sistolica.map(f64::from)
        }),
        ("tension_arterial_diastolica", |r| {
            r.mediciones.tension_arterial_diastolica.map(f64::from)
        }),
        ("frecuencia_cardiaca", |r| {
            r.mediciones.frecuencia_cardiaca.map(f64::from)
        }),
        ("frecuencia_respiratoria", |r| {
            r.mediciones.frecuencia_respiratoria.map(f64::from)
        }),
        ("temperatura", |r| r.mediciones.temperatura),
        ("saturacion_oxigeno", |r| {
            r.mediciones.saturacion_oxigeno.map(f64::from)
        }),
        ("glucemia_capilar", |r| {
            r.mediciones.glucemia_capilar.map(f64::from)
        }),
    ];

    let mut ordered: Vec<&VitalSignReading> = readings.iter().collect();
    ordered.sort_by_key(|r| (r.fecha_hora_registro, r.id));

    metrics
        .iter()
        .filter_map(|(name, extract)| {
            let puntos: Vec<ChartPoint> = ordered
                .iter()
                .filter_map(|r| {
                    extract(r).map(|valor| ChartPoint {
                        fecha_hora: r.fecha_hora_registro,
                        valor,
                    })
                })
                .collect();
            (!puntos.is_empty()).then(|| ChartSeries {
                signo: name.to_string(),
                puntos,
            })
        })
        .collect()
}

/// Render one section of `hoja`. The only place that dispatches on
/// `Section`; it reads from the store and never writes.
pub async fn render(
    store: &dyn Store,
    hoja: &NursingSheet,
    seccion: Section,
) -> Result<SectionView> {
    let contenido = match seccion {
        Section::Signos => SectionContent::Signos {
            lecturas: store.list_vital_signs(hoja.id).await?,
        },
        Section::Medicamentos => SectionContent::Medicamentos {
            registros: store.list_medications(hoja.id).await?,
            catalogo: store.list_products(CatalogFilter::medicamentos()).await?,
        },
        Section::TerapiaIv => SectionContent::TerapiaIv {
            registros: store.list_iv_therapies(hoja.id).await?,
            soluciones: store.list_products(CatalogFilter::soluciones()).await?,
        },
        Section::Sondas => SectionContent::Sondas {
            registros: store.list_catheters(hoja.id).await?,
        },
        Section::Observaciones => SectionContent::Observaciones {
            texto: hoja.observaciones.clone(),
        },
        Section::Graficas => SectionContent::Graficas {
            series: chart_series(&store.list_vital_signs(hoja.id).await?),
        },
        Section::Estudios | Section::Liquidos | Section::Dieta => SectionContent::NoDisponible,
    };

    Ok(SectionView {
        seccion,
        label: seccion.label().to_string(),
        editable: !hoja.is_closed() && seccion.is_writable(),
        contenido,
    })
}

pub fn tabs() -> Vec<SectionTab> {
    Section::ALL
        .iter()
        .map(|section| SectionTab {
            id: *section,
            label: section.label().to_string(),
            disponible: section.is_available(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VitalSigns;
    use chrono::Duration;

    fn reading(id: i64, at: DateTime<Utc>, pulse: Option<i32>, temp: Option<f64>) -> VitalSignReading {
        VitalSignReading {
            id,
            hoja_enfermeria_id: 1,
            fecha_hora_registro: at,
            mediciones: VitalSigns {
                frecuencia_cardiaca: pulse,
                temperatura: temp,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_default_section_is_signos() {
        assert_eq!(Section::default(), Section::Signos);
    }

    #[test]
    fn test_ids_round_trip_through_from_str() {
        for section in Section::ALL {
            assert_eq!(section.id().parse::<Section>().unwrap(), section);
            let json = serde_json::to_value(section).unwrap();
            assert_eq!(json, section.id());
        }
        assert!("laboratorio".parse::<Section>().is_err());
    }

    #[test]
    fn test_unavailable_sections() {
        let unavailable: Vec<_> = Section::ALL
            .iter()
            .filter(|s| !s.is_available())
            .map(|s| s.id())
            .collect();
        assert_eq!(unavailable, vec!["estudios", "liquidos", "dieta"]);
        assert!(!Section::Graficas.is_writable());
        assert!(Section::Sondas.is_writable());
    }

    #[test]
    fn test_tabs_cover_all_sections_in_order() {
        let tabs = tabs();
        assert_eq!(tabs.len(), 9);
        assert_eq!(tabs[0].id, Section::Signos);
        assert_eq!(tabs[0].label, "Tomar Signos");
        assert_eq!(tabs[8].id, Section::Graficas);
    }

    #[test]
    fn test_chart_series_sorted_and_sparse() {
        let t0 = Utc::now();
        let readings = vec![
            reading(2, t0 + Duration::hours(2), Some(90), None),
            reading(1, t0, Some(80), Some(36.5)),
        ];

        let series = chart_series(&readings);
        assert_eq!(series.len(), 2);

        let pulse = &series[0];
        assert_eq!(pulse.signo, "frecuencia_cardiaca");
        assert_eq!(pulse.puntos.len(), 2);
        assert_eq!(pulse.puntos[0].valor, 80.0);
        assert_eq!(pulse.puntos[1].valor, 90.0);

        let temp = &series[1];
        assert_eq!(temp.signo, "temperatura");
        assert_eq!(temp.puntos.len(), 1);
    }

    #[tokio::test]
    async fn test_render_unavailable_and_closed() {
        use crate::db::MemoryStore;

        let store = MemoryStore::new();
        let mut hoja = NursingSheet::new(1, 1, Utc::now());

        let view = render(&store, &hoja, Section::Dieta).await.unwrap();
        assert!(matches!(view.contenido, SectionContent::NoDisponible));
        assert!(!view.editable);

        let view = render(&store, &hoja, Section::Signos).await.unwrap();
        assert!(view.editable);

        hoja.close(None, Utc::now()).unwrap();
        let view = render(&store, &hoja, Section::Observaciones).await.unwrap();
        assert!(!view.editable);
        assert!(matches!(view.contenido, SectionContent::Observaciones { .. }));
    }

    #[test]
    fn test_content_tagging() {
        let json = serde_json::to_value(SectionContent::NoDisponible).unwrap();
        assert_eq!(json["tipo"], "no_disponible");

        let json = serde_json::to_value(SectionContent::Observaciones {
            texto: String::new(),
        })
        .unwrap();
        assert_eq!(json["tipo"], "observaciones");
        assert_eq!(json["datos"]["texto"], "");
    }
}
