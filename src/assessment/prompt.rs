//! French prompt templates. The decoder relies on the section markers these
//! templates ask for, so keep the two in step.

use super::{ImpactAnalysisRequest, ImpactAssessment, PgesRequest, ProjectAnalysisRequest};
use std::fmt::Write as _;

pub const IMPACT_SYSTEM_PROMPT: &str = "Vous êtes un expert en évaluation d'impact environnemental spécialisé dans l'utilisation de la matrice de Léopold. Votre tâche est d'analyser l'interaction entre une activité de projet et une composante environnementale, puis d'attribuer une magnitude et une importance à cet impact, de le justifier et de proposer des mesures d'atténuation appropriées.";

pub const PROJECT_SYSTEM_PROMPT: &str = "Vous êtes un expert en évaluation d'impact environnemental spécialisé dans l'utilisation de la matrice de Léopold. Votre tâche est d'identifier les interactions pertinentes entre les activités d'un projet et les composantes environnementales, puis de suggérer une évaluation préliminaire de ces impacts.";

pub const PGES_SYSTEM_PROMPT: &str = "Vous êtes un expert en gestion environnementale et sociale spécialisé dans l'élaboration de Plans de Gestion Environnementale et Sociale (PGES) pour des projets de génie civil. Votre tâche est de prioriser les impacts identifiés et de proposer des mesures de gestion adaptées.";

/// Lowest and highest number of interactions requested from a project analysis.
pub const SUGGESTED_IMPACTS_RANGE: (usize, usize) = (25, 50);

fn push_optional(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        let _ = writeln!(out, "- {label}: {v}");
    }
}

pub fn impact_prompt(req: &ImpactAnalysisRequest) -> String {
    let mut out = String::new();
    out.push_str(
        "Analyser l'impact environnemental suivant selon la méthodologie de la matrice de Léopold:\n\n",
    );

    out.push_str("ACTIVITÉ DU PROJET:\n");
    let _ = writeln!(out, "- Nom: {}", req.activity_name);
    push_optional(&mut out, "Description", req.activity_description.as_deref());

    out.push_str("\nCOMPOSANTE ENVIRONNEMENTALE AFFECTÉE:\n");
    let _ = writeln!(out, "- Nom: {}", req.component_name);
    let _ = writeln!(out, "- Catégorie: {}", req.component_category);
    push_optional(&mut out, "Description", req.component_description.as_deref());
    out.push('\n');

    match req.assessment {
        ImpactAssessment::Scored {
            magnitude,
            importance,
        } => {
            out.push_str("ÉVALUATION DE L'IMPACT:\n");
            let _ = writeln!(out, "- Magnitude: {magnitude} (échelle de -10 à +10)");
            let _ = writeln!(out, "- Importance: {importance} (échelle de 1 à 10)");
            out.push_str(
                "\nVeuillez fournir:\n\
                 1. Une justification détaillée de cette évaluation, expliquant pourquoi cet impact a cette magnitude et cette importance.\n\
                 2. Une analyse approfondie des conséquences potentielles de cet impact.\n\
                 3. Une liste de mesures d'atténuation spécifiques et concrètes qui pourraient être mises en œuvre.\n",
            );
        }
        ImpactAssessment::Unscored => {
            out.push_str(
                "Veuillez évaluer cet impact et fournir:\n\
                 1. Une magnitude sur une échelle de -10 à +10 (négatif pour les impacts défavorables, positif pour les impacts favorables, jamais 0).\n\
                 2. Une importance sur une échelle de 1 à 10 (1 = peu important, 10 = très important).\n\
                 3. Une justification détaillée de cette évaluation.\n\
                 4. Une analyse approfondie des conséquences potentielles de cet impact.\n\
                 5. Une liste de mesures d'atténuation spécifiques et concrètes qui pourraient être mises en œuvre.\n",
            );
        }
    }

    out.push_str("\nFormat de réponse souhaité:\n");
    if req.assessment == ImpactAssessment::Unscored {
        out.push_str(
            "MAGNITUDE: [Valeur numérique entre -10 et +10, sauf 0]\n\
             IMPORTANCE: [Valeur numérique entre 1 et 10]\n",
        );
    }
    out.push_str(
        "JUSTIFICATION: [Justification de l'évaluation]\n\
         ANALYSE: [Votre analyse détaillée]\n\
         MESURES D'ATTÉNUATION:\n\
         - [Mesure 1]\n\
         - [Mesure 2]\n\
         - [etc.]\n",
    );
    out
}

pub fn project_prompt(req: &ProjectAnalysisRequest) -> String {
    let mut out = String::new();
    out.push_str(
        "Analyser le projet suivant et identifier les interactions pertinentes entre les activités et les composantes environnementales selon la méthodologie de la matrice de Léopold:\n\n",
    );

    out.push_str("PROJET:\n");
    let _ = writeln!(out, "- Nom: {}", req.project_name);
    push_optional(&mut out, "Description", req.project_description.as_deref());

    out.push_str("\nACTIVITÉS DU PROJET:\n");
    for a in &req.activities {
        let _ = write!(out, "- ID: {}, Nom: {}, Phase: {}", a.id, a.name, a.phase);
        if let Some(d) = a.description.as_deref() {
            let _ = write!(out, ", Description: {d}");
        }
        out.push('\n');
    }

    out.push_str("\nCOMPOSANTES ENVIRONNEMENTALES:\n");
    for c in &req.components {
        let _ = write!(out, "- ID: {}, Nom: {}, Catégorie: {}", c.id, c.name, c.category);
        if let Some(d) = c.description.as_deref() {
            let _ = write!(out, ", Description: {d}");
        }
        out.push('\n');
    }

    let (lo, hi) = SUGGESTED_IMPACTS_RANGE;
    let _ = write!(
        out,
        "\nVeuillez identifier les interactions pertinentes ({lo}-{hi} sur l'ensemble des possibilités) entre les activités et les composantes environnementales, et fournir pour chacune:\n\
         1. L'ID de l'activité et l'ID de la composante concernées\n\
         2. Une magnitude estimée sur une échelle de -10 à +10 (négatif pour les impacts défavorables, positif pour les impacts favorables, jamais 0)\n\
         3. Une importance estimée sur une échelle de 1 à 10 (1 = peu important, 10 = très important)\n\
         4. Une brève justification de cette évaluation (1-2 phrases)\n\n\
         Veuillez également fournir une synthèse narrative globale du projet et de ses principaux enjeux environnementaux.\n\n"
    );
    out.push_str(
        "Format de réponse souhaité:\n\
         IMPACTS SUGGÉRÉS:\n\
         1. Activité ID: [ID], Composante ID: [ID], Magnitude: [Valeur], Importance: [Valeur], Justification: [Brève justification]\n\
         2. Activité ID: [ID], Composante ID: [ID], Magnitude: [Valeur], Importance: [Valeur], Justification: [Brève justification]\n\
         [etc.]\n\n\
         SYNTHÈSE NARRATIVE:\n\
         [Votre synthèse narrative du projet et de ses principaux enjeux environnementaux]\n",
    );
    out
}

pub fn pges_prompt(req: &PgesRequest) -> String {
    let mut out = String::new();
    out.push_str(
        "Générer un Plan de Gestion Environnementale et Sociale (PGES) pour le projet suivant:\n\n",
    );

    out.push_str("PROJET:\n");
    let _ = writeln!(out, "- Nom: {}", req.project_name);
    push_optional(&mut out, "Description", req.project_description.as_deref());

    out.push_str("\nIMPACTS IDENTIFIÉS:\n");
    for i in &req.impacts {
        let _ = write!(
            out,
            "- Activité: {} ({}), Composante: {} ({}), Magnitude: {}, Importance: {}",
            i.activity_name,
            i.activity_phase,
            i.component_name,
            i.component_category,
            i.magnitude,
            i.importance
        );
        if let Some(a) = i.analysis.as_deref().filter(|a| !a.trim().is_empty()) {
            let _ = write!(out, ", Analyse: {a}");
        }
        out.push('\n');
    }

    out.push_str(
        "\nVeuillez fournir:\n\
         1. Une synthèse des principaux enjeux environnementaux et sociaux du projet\n\
         2. Une priorisation des impacts (élevée, moyenne, faible) basée sur leur magnitude et leur importance\n\
         3. Des recommandations de mesures correctives regroupées par catégorie (ex: eau, air, biodiversité, social)\n\
         4. Un plan de suivi avec des indicateurs, leur fréquence de mesure et les responsables\n\n\
         Format de réponse souhaité:\n\
         SYNTHÈSE:\n\
         [Votre synthèse des principaux enjeux]\n\n\
         PRIORISATION DES IMPACTS:\n\
         1. Activité: [Nom], Composante: [Nom], Magnitude: [Valeur], Importance: [Valeur], Priorité: [Élevée/Moyenne/Faible]\n\
         2. Activité: [Nom], Composante: [Nom], Magnitude: [Valeur], Importance: [Valeur], Priorité: [Élevée/Moyenne/Faible]\n\
         [etc.]\n\n\
         RECOMMANDATIONS:\n\
         1. Catégorie: [Nom de la catégorie]\n   \
         - [Mesure 1]\n   \
         - [Mesure 2]\n   \
         [etc.]\n\
         2. Catégorie: [Nom de la catégorie]\n   \
         - [Mesure 1]\n   \
         - [Mesure 2]\n   \
         [etc.]\n\n\
         PLAN DE SUIVI:\n\
         1. Indicateur: [Nom de l'indicateur], Fréquence: [Fréquence de mesure], Responsable: [Partie responsable]\n\
         2. Indicateur: [Nom de l'indicateur], Fréquence: [Fréquence de mesure], Responsable: [Partie responsable]\n\
         [etc.]\n",
    );
    out
}
