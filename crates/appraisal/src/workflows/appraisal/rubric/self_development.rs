use std::collections::BTreeMap;

use super::super::domain::{Cadre, FormKind};
use super::{Cap, CategoryRule, FormRubric, SectionRule};

/// Self-Development form (C): 4 sections.
pub(super) fn form_rubric() -> FormRubric {
    let sections = vec![
        SectionRule::new(
            1,
            "development_programmes",
            "Faculty Development Programmes",
            Cap::Limit(30.0),
            vec![
                CategoryRule::per_unit("fdp_one_week", "One week FDP attended", 10.0),
                CategoryRule::per_unit("fdp_two_week", "Two week FDP attended", 15.0),
            ],
        ),
        SectionRule::new(
            2,
            "certifications",
            "Certifications",
            Cap::Limit(30.0),
            vec![
                CategoryRule::per_unit("mooc_certification", "NPTEL / MOOC certification", 10.0),
                CategoryRule::per_unit("industry_certification", "Industry certification", 15.0),
            ],
        ),
        SectionRule::new(
            3,
            "memberships",
            "Professional Memberships",
            Cap::Limit(10.0),
            vec![CategoryRule::per_unit(
                "professional_membership",
                "Professional body membership",
                5.0,
            )],
        ),
        SectionRule::new(
            4,
            "higher_qualification",
            "Higher Qualification",
            Cap::Limit(30.0),
            vec![
                CategoryRule::per_unit("phd_completed", "PhD completed", 30.0),
                CategoryRule::per_unit("pg_completed", "Additional PG degree", 15.0),
            ],
        ),
    ];

    let cadre_caps = BTreeMap::from([
        (Cadre::Professor, Cap::Limit(50.0)),
        (Cadre::AssociateProfessor, Cap::Limit(60.0)),
        (Cadre::AssistantProfessor, Cap::Limit(70.0)),
    ]);

    FormRubric {
        form: FormKind::SelfDevelopment,
        sections,
        cadre_caps,
        cadre_multipliers: None,
    }
}
