use std::collections::BTreeMap;

use super::super::domain::{Cadre, FormKind};
use super::{Cap, CategoryRule, FormRubric, SectionRule, UnitKind};

const SUPERVISING_CADRES: &[Cadre] = &[Cadre::Professor, Cadre::AssociateProfessor];

/// Research form (B): 17 sections.
pub(super) fn form_rubric() -> FormRubric {
    let sections = vec![
        SectionRule::new(
            1,
            "journal_papers",
            "Journal Papers",
            Cap::Unlimited,
            vec![
                CategoryRule::per_unit("journal_sci", "SCI journal paper", 100.0),
                CategoryRule::per_unit("journal_scopus_wos", "Scopus / WoS journal paper", 50.0),
                CategoryRule::per_unit("journal_ugc_care", "UGC-CARE journal paper", 20.0),
                CategoryRule::per_unit("journal_other", "Other peer reviewed journal", 5.0),
            ],
        ),
        SectionRule::new(
            2,
            "conference_papers",
            "Conference Papers",
            Cap::Limit(180.0),
            vec![
                CategoryRule::per_unit("conference_scopus_wos", "Scopus / WoS conference", 30.0),
                CategoryRule::per_unit("conference_other", "Other conference", 10.0),
            ],
        ),
        SectionRule::new(
            3,
            "book_chapters",
            "Book Chapters",
            Cap::Limit(90.0),
            vec![
                CategoryRule::per_unit("book_chapter_indexed", "Indexed book chapter", 30.0),
                CategoryRule::per_unit("book_chapter_other", "Other book chapter", 15.0),
            ],
        ),
        SectionRule::new(
            4,
            "books",
            "Books",
            Cap::Limit(200.0),
            vec![
                CategoryRule::per_unit("book_international", "International publisher", 100.0),
                CategoryRule::per_unit("book_national", "National publisher", 50.0),
            ],
        ),
        SectionRule::new(
            5,
            "citations",
            "Citations",
            Cap::Limit(60.0),
            vec![CategoryRule::per_divisor(
                "citations",
                "Citations (3 marks per 3 citations)",
                UnitKind::Count,
                3.0,
                3.0,
            )],
        ),
        SectionRule::new(
            6,
            "patents",
            "Patents",
            Cap::Unlimited,
            vec![
                CategoryRule::per_unit("patent_granted", "Patent granted", 100.0),
                CategoryRule::per_unit("patent_published", "Patent published", 50.0),
                CategoryRule::per_unit("patent_filed", "Patent filed", 20.0),
            ],
        ),
        SectionRule::new(
            7,
            "copyrights_designs",
            "Copyrights and Designs",
            Cap::Limit(30.0),
            vec![
                CategoryRule::per_unit("copyright_registered", "Copyright registered", 10.0),
                CategoryRule::per_unit("design_registered", "Industrial design registered", 15.0),
            ],
        ),
        SectionRule::new(
            8,
            "funded_projects",
            "Funded Research Projects",
            Cap::Unlimited,
            vec![CategoryRule::per_divisor(
                "grant_amount",
                "Sanctioned grant (10 marks per Rs 2,00,000)",
                UnitKind::Amount,
                200_000.0,
                10.0,
            )],
        ),
        SectionRule::new(
            9,
            "consultancy",
            "Consultancy",
            Cap::Limit(50.0),
            vec![CategoryRule::per_divisor(
                "consultancy_amount",
                "Consultancy revenue (10 marks per Rs 1,00,000)",
                UnitKind::Amount,
                100_000.0,
                10.0,
            )],
        ),
        SectionRule::new(
            10,
            "phd_guidance",
            "PhD Guidance",
            Cap::Limit(100.0),
            vec![
                CategoryRule::per_unit("phd_awarded", "PhD awarded under guidance", 50.0)
                    .only(SUPERVISING_CADRES),
                CategoryRule::per_unit("phd_ongoing", "PhD scholar registered", 10.0)
                    .only(SUPERVISING_CADRES),
            ],
        ),
        SectionRule::new(
            11,
            "awards",
            "Awards and Recognitions",
            Cap::Limit(60.0),
            vec![
                CategoryRule::per_unit("award_international", "International award", 30.0),
                CategoryRule::per_unit("award_national", "National award", 20.0),
                CategoryRule::per_unit("award_state", "State award", 10.0),
            ],
        ),
        SectionRule::new(
            12,
            "editorial_roles",
            "Editorial and Reviewer Roles",
            Cap::Limit(30.0),
            vec![
                CategoryRule::per_unit("journal_editor", "Journal editor", 10.0),
                CategoryRule::per_unit("journal_reviewer", "Journal reviewer", 5.0).capped(15.0),
            ],
        ),
        SectionRule::new(
            13,
            "invited_talks",
            "Invited Talks",
            Cap::Limit(30.0),
            vec![
                CategoryRule::per_unit("talk_international", "International invited talk", 10.0),
                CategoryRule::per_unit("talk_national", "National invited talk", 5.0),
            ],
        ),
        SectionRule::new(
            14,
            "products_startups",
            "Products and Startups",
            Cap::Limit(100.0),
            vec![
                CategoryRule::per_unit("technology_transfer", "Technology transferred", 50.0),
                CategoryRule::per_unit("startup_incubated", "Startup incubated", 50.0),
            ],
        ),
        SectionRule::new(
            15,
            "fellowships",
            "Professional Fellowships",
            Cap::Limit(20.0),
            vec![CategoryRule::per_unit("fellowship", "Fellowship of a professional body", 10.0)],
        ),
        SectionRule::new(
            16,
            "collaborations",
            "Research Collaborations",
            Cap::Limit(30.0),
            vec![CategoryRule::per_unit("mou_active", "Active research MoU", 10.0)],
        ),
        SectionRule::new(
            17,
            "events_organised",
            "Conferences and Workshops Organised",
            Cap::Limit(40.0),
            vec![
                CategoryRule::per_unit("event_international", "International event", 20.0),
                CategoryRule::per_unit("event_national", "National event", 10.0),
            ],
        ),
    ];

    let cadre_caps = BTreeMap::from([
        (Cadre::Professor, Cap::Limit(370.0)),
        (Cadre::AssociateProfessor, Cap::Limit(300.0)),
        (Cadre::AssistantProfessor, Cap::Limit(210.0)),
    ]);

    FormRubric {
        form: FormKind::Research,
        sections,
        cadre_caps,
        cadre_multipliers: None,
    }
}
