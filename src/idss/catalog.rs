use super::consolidation::Consolidation;
use super::domain::{
    ContributionMode, DimensionId, OperatorSize, Periodicity, TargetDirection, WeightLevel,
};
use super::scoring::{ParameterSet, ParametersBySize, ScoringShape, StepBand};
use serde::Serialize;
use std::sync::OnceLock;

/// Static definition of a scored indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub simple_name: &'static str,
    pub dimension_id: DimensionId,
    pub weight_in_dimension: f64,
    pub contribution: ContributionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idss_weight_level: Option<WeightLevel>,
    pub description: &'static str,
    pub target_description: &'static str,
    pub responsible_sector: &'static str,
    pub target_direction: TargetDirection,
    pub periodicity_options: Vec<Periodicity>,
    pub default_periodicity: Periodicity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters_by_porte: Option<ParametersBySize>,
    pub requires_aux_value: bool,
    pub is_rate: bool,
    pub value_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_value_label: Option<&'static str>,
    pub scoring: ScoringShape,
    pub consolidation: Consolidation,
}

impl IndicatorDefinition {
    pub fn supports(&self, periodicity: Periodicity) -> bool {
        self.periodicity_options.contains(&periodicity)
    }

    pub fn is_bonus(&self) -> bool {
        self.contribution == ContributionMode::Bonus
    }

    pub fn parameters_for(&self, operator_size: OperatorSize) -> Option<&ParameterSet> {
        self.parameters_by_porte.as_ref()?.get(&operator_size)
    }

    pub fn score(
        &self,
        value: Option<f64>,
        aux: Option<f64>,
        operator_size: OperatorSize,
    ) -> Option<f64> {
        self.scoring.score(
            value,
            aux,
            Some(operator_size),
            self.parameters_by_porte.as_ref(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionDefinition {
    pub id: DimensionId,
    pub name: &'static str,
    pub weight_in_idss: f64,
}

/// The fixed set of dimensions and indicators making up the index.
#[derive(Debug, Serialize)]
pub struct IndicatorCatalog {
    dimensions: Vec<DimensionDefinition>,
    indicators: Vec<IndicatorDefinition>,
}

impl IndicatorCatalog {
    /// Process-wide catalog, built on first use and never mutated.
    pub fn standard() -> &'static Self {
        static CATALOG: OnceLock<IndicatorCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| Self {
            dimensions: standard_dimensions(),
            indicators: standard_indicators(),
        })
    }

    pub fn dimensions(&self) -> &[DimensionDefinition] {
        &self.dimensions
    }

    pub fn indicators(&self) -> &[IndicatorDefinition] {
        &self.indicators
    }

    pub fn indicator(&self, id: &str) -> Option<&IndicatorDefinition> {
        self.indicators.iter().find(|indicator| indicator.id == id)
    }

    pub fn indicators_for(&self, dimension: DimensionId) -> Vec<&IndicatorDefinition> {
        self.indicators
            .iter()
            .filter(|indicator| indicator.dimension_id == dimension)
            .collect()
    }
}

fn standard_dimensions() -> Vec<DimensionDefinition> {
    [
        (DimensionId::Idqs, 0.30),
        (DimensionId::Idga, 0.30),
        (DimensionId::Idsm, 0.30),
        (DimensionId::Idgr, 0.10),
    ]
    .into_iter()
    .map(|(id, weight_in_idss)| DimensionDefinition {
        id,
        name: id.label(),
        weight_in_idss,
    })
    .collect()
}

fn same_for_all_sizes(params: &[(&'static str, f64)]) -> Option<ParametersBySize> {
    Some(
        OperatorSize::ordered()
            .into_iter()
            .map(|size| (size, params.iter().copied().collect()))
            .collect(),
    )
}

fn per_size(
    pequeno: (f64, f64),
    medio: (f64, f64),
    grande: (f64, f64),
) -> Option<ParametersBySize> {
    Some(
        [
            (OperatorSize::Pequeno, pequeno),
            (OperatorSize::Medio, medio),
            (OperatorSize::Grande, grande),
        ]
        .into_iter()
        .map(|(size, (target, worse))| {
            (size, ParameterSet::from([("target", target), ("worse", worse)]))
        })
        .collect(),
    )
}

fn higher_is_better(target: f64, worse: f64) -> ScoringShape {
    ScoringShape::ThresholdInterpolate {
        target,
        worse,
        better_is_lower: false,
    }
}

fn lower_is_better(target: f64, worse: f64) -> ScoringShape {
    ScoringShape::ThresholdInterpolate {
        target,
        worse,
        better_is_lower: true,
    }
}

const FULL_CADENCES: [Periodicity; 4] = [
    Periodicity::Anual,
    Periodicity::Semestral,
    Periodicity::Trimestral,
    Periodicity::Mensal,
];

/// Defaults shared by most weighted indicators; each entry overrides what differs.
fn weighted(
    id: &'static str,
    dimension_id: DimensionId,
    weight_in_dimension: f64,
    idss_weight_level: WeightLevel,
) -> IndicatorDefinition {
    IndicatorDefinition {
        id,
        name: "",
        simple_name: "",
        dimension_id,
        weight_in_dimension,
        contribution: ContributionMode::Weighted,
        idss_weight_level: Some(idss_weight_level),
        description: "",
        target_description: "",
        responsible_sector: "",
        target_direction: TargetDirection::Up,
        periodicity_options: FULL_CADENCES.to_vec(),
        default_periodicity: Periodicity::Anual,
        parameters_by_porte: None,
        requires_aux_value: false,
        is_rate: false,
        value_label: "",
        aux_value_label: None,
        scoring: ScoringShape::Flag,
        consolidation: Consolidation::Mean,
    }
}

/// Annual-only bonus indicator; defaults to a participation flag.
fn bonus(id: &'static str, dimension_id: DimensionId, weight_in_dimension: f64) -> IndicatorDefinition {
    IndicatorDefinition {
        contribution: ContributionMode::Bonus,
        idss_weight_level: None,
        target_direction: TargetDirection::None,
        periodicity_options: vec![Periodicity::Anual],
        value_label: "Participou (1=Sim, 0=Não)",
        consolidation: Consolidation::FirstValue,
        ..weighted(id, dimension_id, weight_in_dimension, WeightLevel::Low)
    }
}

fn standard_indicators() -> Vec<IndicatorDefinition> {
    use DimensionId::{Idga, Idgr, Idqs, Idsm};
    use WeightLevel::{High, Low, Medium};

    vec![
        // IDQS
        IndicatorDefinition {
            name: "Proporção de Parto Cesáreo",
            simple_name: "Parto Cesáreo",
            description: "Percentual de partos cesáreos realizados pela operadora no período considerado.",
            target_description: "Meta: Taxa ≤ 45% OU Redução da taxa em relação ao ano anterior ≥ 10%. Pontuação 0 se taxa ≥ 80% E Redução ≤ 5%.",
            responsible_sector: "Atenção à Saúde",
            target_direction: TargetDirection::Down,
            is_rate: true,
            value_label: "Taxa Parto Cesáreo (%)",
            scoring: lower_is_better(45.0, 80.0),
            ..weighted("1.1", Idqs, 3.0, High)
        },
        IndicatorDefinition {
            name: "Taxa de Consultas Médicas de Pré-Natal",
            simple_name: "Pré-Natal",
            description: "Número médio de consultas médicas de pré-natal por beneficiária grávida no período considerado.",
            target_description: "Meta: ≥ 7 consultas. Pontuação 0 se ≤ 2 consultas.",
            responsible_sector: "Atenção à Saúde",
            value_label: "Nº Médio Consultas",
            scoring: higher_is_better(7.0, 2.0),
            ..weighted("1.2", Idqs, 2.0, Medium)
        },
        IndicatorDefinition {
            name: "Taxa de Internação por Fratura de Fêmur em Idosos",
            simple_name: "Fratura Fêmur Idosos",
            description: "Número médio de internações hospitalares por Fratura de Fêmur para cada 1000 beneficiários na faixa etária de 60 anos ou mais.",
            target_description: "Atingir valor menor ou igual à média das medianas por porte (ano atual e anterior) + 20%.",
            responsible_sector: "Atenção à Saúde",
            target_direction: TargetDirection::Down,
            parameters_by_porte: per_size((3.435, 8.588), (4.841, 12.103), (4.271, 10.677)),
            value_label: "Taxa/1000 benef. 60+",
            scoring: ScoringShape::SizeParametrized { better_is_lower: true },
            ..weighted("1.3", Idqs, 2.0, Medium)
        },
        IndicatorDefinition {
            name: "Razão de Consultas Ambulatoriais de Pediatria por Beneficiário de 0 a 4 anos",
            simple_name: "Consultas Pediatria 0-4 anos",
            description: "Razão de consultas ambulatoriais de pediatria para crianças de 0 a 4 anos em relação ao total de consultas recomendadas na literatura.",
            target_description: "Meta: Razão ≥ 0,95. Pontuação 0 se Razão ≤ 0,10.",
            responsible_sector: "Atenção à Saúde",
            value_label: "Razão Consultas Pediatria",
            scoring: higher_is_better(0.95, 0.10),
            ..weighted("1.4", Idqs, 2.0, Medium)
        },
        IndicatorDefinition {
            name: "Taxa de Citopatologia Cérvico-Vaginal Oncótica",
            simple_name: "Papanicolau",
            description: "Número de procedimentos diagnósticos em citopatologia cérvico-vaginal oncótica para cada 100 beneficiárias de 25 a 64 anos.",
            target_description: "Meta: ≥ 33 exames/100 benef. Pontuação 0 se ≤ 3 exames/100 benef.",
            responsible_sector: "Atenção à Saúde",
            value_label: "Taxa Exames/100 Benef.",
            scoring: higher_is_better(33.0, 3.0),
            ..weighted("1.5", Idqs, 2.0, Medium)
        },
        IndicatorDefinition {
            name: "Taxa de Exames de Hemoglobina Glicada",
            simple_name: "Hemoglobina Glicada",
            description: "Número médio de exames de hemoglobina glicada por beneficiário com diabetes (19-75 anos).",
            target_description: "Meta: ≥ 2 exames/benef./ano. Pontuação 0 se ≤ 0,20 exames/benef./ano.",
            responsible_sector: "Atenção à Saúde",
            value_label: "Nº Médio Exames/Benef.",
            scoring: higher_is_better(2.0, 0.20),
            ..weighted("1.6", Idqs, 3.0, High)
        },
        IndicatorDefinition {
            name: "Razão de Consultas Médicas Ambulatoriais com Generalista/Especialista para idosos",
            simple_name: "Consultas Idosos Generalista/Especialista",
            description: "Razão de consultas ambulatoriais com generalistas pelo número de consultas com especialistas para beneficiários de 60+ anos.",
            target_description: "Meta: Razão ≥ 0,3 (Ex: 1,5 consultas generalista para 5 especialista). Pontuação 0 se Razão ≤ 0,0769 (1 para 13).",
            responsible_sector: "Rede Credenciada",
            value_label: "Razão Consultas Generalista/Especialista",
            scoring: higher_is_better(0.3, 0.0769),
            ..weighted("1.9", Idqs, 3.0, High)
        },
        IndicatorDefinition {
            name: "Programa de Promoção da Saúde e Prevenção de Riscos e Doenças – Pontuação Base",
            simple_name: "Promoção e Prevenção (Bônus)",
            description: "Pontuação base atribuída se a operadora tiver programas de promoção da saúde e prevenção de riscos e doenças cadastrados e aprovados na ANS.",
            target_description: "Participar (Formulário de Cadastramento e Monitoramento aprovados).",
            responsible_sector: "Atenção à Saúde",
            ..bonus("1.10", Idqs, 0.1)
        },
        IndicatorDefinition {
            name: "Participação em Programas de Indução de Melhoria da Qualidade - Pontuação Base",
            simple_name: "Projetos Indução Qualidade (Bônus)",
            description: "Pontuação base por participação em Programas de Certificação em Boas Práticas ou Projetos de Indução de Qualidade (APS, Parto Adequado).",
            target_description: "Participar em pelo menos um dos programas/projetos elegíveis.",
            responsible_sector: "Qualidade",
            ..bonus("1.11", Idqs, 0.15)
        },
        IndicatorDefinition {
            name: "Participação no Projeto de Modelos de Remuneração Baseados em Valor- Pontuação Base",
            simple_name: "Remuneração por Valor (Bônus)",
            description: "Pontuação base por participação no Projeto de Modelos de Remuneração Baseados em Valor da ANS.",
            target_description: "Participar efetivamente do projeto (2ª edição).",
            responsible_sector: "Rede Credenciada",
            ..bonus("1.12", Idqs, 0.1)
        },
        // IDGA
        IndicatorDefinition {
            name: "Taxa de Sessões de Hemodiálise Crônica por Beneficiário",
            simple_name: "Hemodiálise Crônica",
            description: "Número médio de sessões de hemodiálise crônica realizadas por beneficiário.",
            target_description: "Resultado ≥ 0,062 sessões/benef./ano E Taxa de Utilização do SUS < 0,0011513.",
            responsible_sector: "Rede Credenciada",
            requires_aux_value: true,
            value_label: "Sessões/Benef./Ano",
            aux_value_label: Some("Taxa Utilização SUS"),
            scoring: ScoringShape::DualGated {
                target: 0.062,
                aux_ceiling: 0.0011513,
                ungated_full_score: 0.9,
                ungated_factor: 0.8,
            },
            ..weighted("2.1", Idga, 1.0, Low)
        },
        IndicatorDefinition {
            name: "Taxa de Consultas Médicas Ambulatoriais com Generalista por Idosos",
            simple_name: "Consultas Generalista Idosos",
            description: "Número médio de consultas ambulatoriais com médico generalista por idoso (60+ anos), limitado a 2 consultas/benef./ano.",
            target_description: "Meta: ≥ 2 consultas/idoso/ano. Pontuação 0 se ≤ 0,7.",
            responsible_sector: "Rede Credenciada",
            value_label: "Nº Médio Consultas/Idoso",
            scoring: higher_is_better(2.0, 0.7),
            ..weighted("2.2", Idga, 2.0, Medium)
        },
        IndicatorDefinition {
            name: "Índice de Dispersão Combinado de Serviços de Urgência e Emergência 24 Horas",
            simple_name: "Dispersão Urgência/Emergência",
            description: "Analisa a dispersão e utilização dos serviços de urgência e emergência 24h.",
            target_description: "Meta: 100% (Dispersão de 100%).",
            responsible_sector: "Rede Credenciada",
            is_rate: true,
            value_label: "Índice (%)",
            scoring: higher_is_better(100.0, 0.0),
            ..weighted("2.3", Idga, 1.0, Low)
        },
        IndicatorDefinition {
            name: "Frequência de Utilização de Rede de Hospitais com Atributo de Qualidade",
            simple_name: "Uso Rede Hospitalar Qualificada",
            description: "Proporção de utilização de hospitais com acreditação QUALISS ou outras certificações ISQUA.",
            target_description: "Meta: ≥ 0,30 (30%).",
            responsible_sector: "Rede Credenciada",
            is_rate: true,
            value_label: "Frequência (%)",
            scoring: higher_is_better(0.30, 0.0),
            ..weighted("2.6", Idga, 1.0, Low)
        },
        IndicatorDefinition {
            name: "Frequência de Utilização de Rede de SADT com Atributo de Qualidade",
            simple_name: "Uso Rede SADT Qualificada",
            description: "Proporção de utilização de SADT com acreditação QUALISS ou outras certificações ISQUA.",
            target_description: "Meta: ≥ 0,20 (20%).",
            responsible_sector: "Rede Credenciada",
            is_rate: true,
            value_label: "Frequência (%)",
            scoring: higher_is_better(0.20, 0.0),
            ..weighted("2.7", Idga, 1.0, Low)
        },
        IndicatorDefinition {
            name: "Índice de efetiva comercialização de planos individuais - Bônus",
            simple_name: "Comercialização Planos Individuais (Bônus)",
            description: "Crescimento de beneficiários titulares na carteira de planos individuais regulamentados.",
            target_description: "Crescimento da carteira: MH ≥ 1,5% a.a.; OD ≥ 4,0% a.a.",
            responsible_sector: "Comercial",
            value_label: "Atingiu Meta (1=Sim, 0=Não)",
            ..bonus("2.8", Idga, 0.1)
        },
        IndicatorDefinition {
            name: "Frequência de Utilização de Rede de Hospitais com Atributo: Qualidade Monitorada - Bônus",
            simple_name: "Uso Hospitais Qualidade Monitorada (Bônus)",
            description: "Proporção de utilização de hospitais gerais que participam do PM-Qualiss Hospitalar.",
            target_description: "Frequência ≥ 90% para bônus máximo de 20%.",
            responsible_sector: "Rede Credenciada",
            is_rate: true,
            value_label: "Frequência (%)",
            scoring: ScoringShape::Passthrough,
            consolidation: Consolidation::Mean,
            ..bonus("2.10", Idga, 0.2)
        },
        // IDSM
        IndicatorDefinition {
            name: "Índice de Capital Regulatório (ICR)",
            simple_name: "Capital Regulatório (ICR)",
            description: "Razão entre o Patrimônio Líquido Ajustado e o Capital Regulatório exigido.",
            target_description: "Meta: ICR ≥ 1 (100%). Pontuação varia de 0 a 1 conforme faixas de ICR.",
            responsible_sector: "Financeiro",
            periodicity_options: vec![
                Periodicity::Anual,
                Periodicity::Quadrimestral,
                Periodicity::Trimestral,
            ],
            value_label: "ICR (Ratio)",
            scoring: ScoringShape::PiecewiseStep {
                bands: vec![
                    StepBand { lower_bound: 3.5, score: 1.0 },
                    StepBand { lower_bound: 2.0, score: 0.975 },
                    StepBand { lower_bound: 1.3, score: 0.95 },
                    StepBand { lower_bound: 1.0, score: 0.90 },
                ],
            },
            consolidation: Consolidation::LastValue,
            ..weighted("3.1", Idsm, 3.0, High)
        },
        IndicatorDefinition {
            name: "Taxa de Resolutividade de Notificação de Intermediação Preliminar",
            simple_name: "Resolutividade NIP",
            description: "Taxa de demandas NIP classificadas como INATIVA, NP ou RVE em relação ao total de demandas NIP classificadas.",
            target_description: "Meta: Taxa ≥ 95%. Pontuação 0 se < 70% (com exceções).",
            responsible_sector: "Relacionamento com Cliente",
            periodicity_options: vec![Periodicity::Anual, Periodicity::Trimestral, Periodicity::Mensal],
            is_rate: true,
            value_label: "Taxa Resolutividade (%)",
            scoring: higher_is_better(95.0, 70.0),
            ..weighted("3.2", Idsm, 2.0, Medium)
        },
        IndicatorDefinition {
            name: "Índice Geral de Reclamação Anual (IGR Anual)",
            simple_name: "IGR Anual",
            description: "Número médio de reclamações de beneficiários (NIPs) para cada 100.000 beneficiários, por segmento (MH/OD).",
            target_description: "Meta IGR_MH ≤ 2; Meta IGR_OD ≤ 0,5. Pontuação 0 se IGR_MH ≥ 30 ou IGR_OD ≥ 1,5.",
            responsible_sector: "Relacionamento com Cliente",
            target_direction: TargetDirection::Down,
            periodicity_options: vec![Periodicity::Anual, Periodicity::Mensal],
            default_periodicity: Periodicity::Mensal,
            parameters_by_porte: same_for_all_sizes(&[("target", 2.0), ("worse", 30.0)]),
            value_label: "IGR (Reclamações/100k)",
            scoring: ScoringShape::SizeParametrized { better_is_lower: true },
            ..weighted("3.3", Idsm, 1.0, Low)
        },
        IndicatorDefinition {
            name: "Proporção de NTRPs com Valor Comercial da Mensalidade Atípicos",
            simple_name: "NTRPs com Mensalidade Atípica",
            description: "Proporção de NTRPs com VCM abaixo do limite inferior estatístico.",
            target_description: "Meta: Proporção ≤ 0,05 (5%). Pontuação 0 se ≥ 0,95 (95%).",
            responsible_sector: "Atuarial",
            target_direction: TargetDirection::Down,
            periodicity_options: vec![Periodicity::Anual],
            is_rate: true,
            value_label: "Proporção NTRPs Atípicos (%)",
            scoring: lower_is_better(0.05, 0.95),
            ..weighted("3.4", Idsm, 1.0, Low)
        },
        IndicatorDefinition {
            name: "Pesquisa de Satisfação do Beneficiário - Pontuação base",
            simple_name: "Satisfação Beneficiário (Bônus)",
            description: "Pontuação base para Operadoras que realizam e divulgam Pesquisa de Satisfação de Beneficiário conforme metodologia ANS.",
            target_description: "Realizar, auditar, divulgar e comunicar à ANS.",
            responsible_sector: "Relacionamento com Cliente",
            value_label: "Realizou Pesquisa (1=Sim, 0=Não)",
            ..bonus("3.5", Idsm, 0.25)
        },
        IndicatorDefinition {
            name: "Índice de Reajuste Médio Ponderado aplicado aos Planos Coletivos",
            simple_name: "Reajuste Planos Coletivos",
            description: "Avalia a média ponderada dos reajustes aplicados e a dispersão (CV) desses reajustes em planos coletivos.",
            target_description: "Média Ponderada ≤ RPC e Coeficiente de Variação (CV) ≤ 0,15.",
            responsible_sector: "Atuarial",
            target_direction: TargetDirection::Down,
            periodicity_options: vec![Periodicity::Anual],
            parameters_by_porte: same_for_all_sizes(&[("indiceReferenciaRPC", 0.08)]),
            requires_aux_value: true,
            value_label: "Média Reajuste (%)",
            aux_value_label: Some("Coef. Variação (CV)"),
            scoring: ScoringShape::CompositeAverage {
                reference_parameter: "indiceReferenciaRPC",
                dispersion_target: 0.15,
                dispersion_worse: 1.0,
            },
            consolidation: Consolidation::FirstValue,
            ..weighted("3.6", Idsm, 1.0, Low)
        },
        // IDGR
        IndicatorDefinition {
            name: "Índice composto de Qualidade Cadastral (SIB)",
            simple_name: "Qualidade Cadastral (SIB)",
            description: "Mede a qualidade do preenchimento dos campos identificadores do beneficiário e do plano no SIB.",
            target_description: "Meta: 100% de qualidade. Bônus se % Dependentes Menores Validados > 85% ou > 95%.",
            responsible_sector: "Cadastro",
            periodicity_options: vec![Periodicity::Anual, Periodicity::Mensal],
            requires_aux_value: true,
            is_rate: true,
            value_label: "% Campos Válidos",
            aux_value_label: Some("% Dep. Menores Válidos"),
            scoring: ScoringShape::AuxBonus {
                target: 99.0,
                worse: 65.0,
                full_bonus_above: 95.0,
                full_bonus: 0.10,
                partial_bonus_from: 85.0,
                partial_bonus: 0.05,
            },
            ..weighted("4.1", Idgr, 2.0, Medium)
        },
        IndicatorDefinition {
            name: "Taxa de utilização do SUS",
            simple_name: "Utilização do SUS",
            description: "Classifica operadoras conforme sua utilização do SUS, baseada no número de eventos de utilização da rede pública.",
            target_description: "Resultado (Taxa_Op) ≤ Percentil 80 (P80) do setor. Pontuação 0 se Resultado ≥ P97,5.",
            responsible_sector: "Financeiro",
            target_direction: TargetDirection::Down,
            periodicity_options: vec![Periodicity::Anual],
            parameters_by_porte: same_for_all_sizes(&[("target", 0.0011513), ("worse", 0.034669376)]),
            value_label: "Taxa Utilização SUS",
            scoring: ScoringShape::SizeParametrized { better_is_lower: true },
            consolidation: Consolidation::FirstValue,
            ..weighted("4.2", Idgr, 1.0, Low)
        },
        IndicatorDefinition {
            name: "Razão de Completude do Envio dos Dados do Padrão TISS (Razão TISS/DIOPS)",
            simple_name: "Completude TISS/DIOPS",
            description: "Relação entre o Total do Valor Informado em Reais (TISS) e o Total do Valor em Reais da Despesa (DIOPS).",
            target_description: "Meta: Razão = 1,0 (100%). Pontuação 0 se < 0,30 (30%).",
            responsible_sector: "Contas Médicas",
            periodicity_options: vec![Periodicity::Anual, Periodicity::Trimestral, Periodicity::Mensal],
            value_label: "Razão TISS/DIOPS",
            scoring: higher_is_better(1.0, 0.30),
            ..weighted("4.3", Idgr, 2.0, Medium)
        },
        IndicatorDefinition {
            name: "Proporção de Glosas de Pagamentos a Prestadores de Serviços de Saúde",
            simple_name: "Proporção de Glosas",
            description: "Relação entre valores glosados e informados (financeiro) e entre prestadores com glosa e total de prestadores (quantitativo).",
            target_description: "Resultado ≤ Percentil 15 (P15) do setor/segmento. Pontuação 0 se Resultado > P85.",
            responsible_sector: "Contas Médicas",
            target_direction: TargetDirection::Down,
            periodicity_options: vec![Periodicity::Anual, Periodicity::Trimestral, Periodicity::Mensal],
            parameters_by_porte: same_for_all_sizes(&[("target", 0.025736833), ("worse", 0.215059903)]),
            value_label: "Proporção Glosas",
            scoring: ScoringShape::SizeParametrized { better_is_lower: true },
            ..weighted("4.4", Idgr, 1.0, Low)
        },
        IndicatorDefinition {
            name: "Proporção de Diagnósticos Inespecíficos nos Eventos de Internação Preenchidos nas Guias TISS - Bônus",
            simple_name: "Diagnósticos Inespecíficos (Bônus)",
            description: "Relação entre quantidade de diagnósticos inespecíficos e o total de eventos de internação com CID.",
            target_description: "Resultado ≤ 30% para bônus de 10% no IDGR.",
            responsible_sector: "Contas Médicas",
            is_rate: true,
            value_label: "Proporção Diag. Inespecíficos (%)",
            scoring: ScoringShape::CeilingFlag { ceiling: 0.30 },
            consolidation: Consolidation::Mean,
            ..bonus("4.5", Idgr, 0.1)
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_covers_every_dimension() {
        let catalog = IndicatorCatalog::standard();
        assert_eq!(catalog.indicators().len(), 28);
        assert_eq!(catalog.dimensions().len(), 4);
        for dimension in DimensionId::ordered() {
            assert!(
                !catalog.indicators_for(dimension).is_empty(),
                "{dimension} has indicators"
            );
        }
    }

    #[test]
    fn indicator_ids_are_unique_and_described() {
        let catalog = IndicatorCatalog::standard();
        let mut seen = HashSet::new();
        for indicator in catalog.indicators() {
            assert!(seen.insert(indicator.id), "duplicate id {}", indicator.id);
            assert!(!indicator.name.is_empty(), "{} has a name", indicator.id);
            assert!(!indicator.simple_name.is_empty());
            assert!(!indicator.responsible_sector.is_empty());
            assert!(indicator.weight_in_dimension > 0.0);
            assert!(indicator.supports(indicator.default_periodicity));
        }
    }

    #[test]
    fn bonus_flag_is_explicit() {
        let catalog = IndicatorCatalog::standard();
        let bonus_ids: Vec<_> = catalog
            .indicators()
            .iter()
            .filter(|indicator| indicator.is_bonus())
            .map(|indicator| indicator.id)
            .collect();
        assert_eq!(bonus_ids, ["1.10", "1.11", "1.12", "2.8", "2.10", "3.5", "4.5"]);
    }

    #[test]
    fn every_indicator_scores_null_as_null() {
        let catalog = IndicatorCatalog::standard();
        for indicator in catalog.indicators() {
            for size in OperatorSize::ordered() {
                assert_eq!(indicator.score(None, Some(0.5), size), None, "{}", indicator.id);
                assert_eq!(indicator.score(None, None, size), None, "{}", indicator.id);
            }
        }
    }

    #[test]
    fn parametrized_indicators_have_parameters_for_every_size() {
        let catalog = IndicatorCatalog::standard();
        for indicator in catalog.indicators() {
            if matches!(
                indicator.scoring,
                ScoringShape::SizeParametrized { .. } | ScoringShape::CompositeAverage { .. }
            ) {
                for size in OperatorSize::ordered() {
                    assert!(indicator.parameters_for(size).is_some(), "{}", indicator.id);
                }
            }
        }
    }
}
