use std::collections::BTreeMap;

use super::super::domain::{Cadre, FormKind};
use super::{Cap, CategoryRule, FormRubric, SectionRule, UnitKind};

/// Teaching form (A). Cadres share one point scale, so the raw sum is rescaled
/// per cadre before the cap.
pub(super) fn form_rubric() -> FormRubric {
    let sections = vec![
        SectionRule::new(
            1,
            "course_delivery",
            "Course Delivery",
            Cap::Limit(100.0),
            vec![CategoryRule::per_divisor(
                "contact_hours",
                "Contact hours (5 marks per 10 hours)",
                UnitKind::Count,
                10.0,
                5.0,
            )],
        ),
        SectionRule::new(
            2,
            "course_results",
            "Course Results",
            Cap::Limit(60.0),
            vec![
                CategoryRule::per_unit("course_pass_90", "Course with pass rate >= 90%", 20.0),
                CategoryRule::per_unit("course_pass_75", "Course with pass rate >= 75%", 10.0),
            ],
        ),
        SectionRule::new(
            3,
            "student_feedback",
            "Student Feedback",
            Cap::Limit(60.0),
            vec![
                CategoryRule::per_unit("feedback_excellent", "Course rated excellent", 20.0),
                CategoryRule::per_unit("feedback_good", "Course rated good", 10.0),
            ],
        ),
        SectionRule::new(
            4,
            "course_material",
            "Course Files and Lab Manuals",
            Cap::Limit(40.0),
            vec![
                CategoryRule::per_unit("course_file", "Course file maintained", 5.0),
                CategoryRule::per_unit("lab_manual", "Lab manual prepared", 10.0),
            ],
        ),
        SectionRule::new(
            5,
            "new_courses",
            "New Courses Developed",
            Cap::Limit(40.0),
            vec![CategoryRule::per_unit("course_developed", "Course developed", 20.0)],
        ),
        SectionRule::new(
            6,
            "projects_guided",
            "Student Projects Guided",
            Cap::Limit(40.0),
            vec![
                CategoryRule::per_unit("ug_project", "UG project batch", 5.0),
                CategoryRule::per_unit("pg_project", "PG project", 10.0),
            ],
        ),
        SectionRule::new(
            7,
            "mentoring",
            "Student Mentoring",
            Cap::Limit(30.0),
            vec![CategoryRule::per_unit("mentee_group", "Mentee group", 10.0)],
        ),
        SectionRule::new(
            8,
            "e_content",
            "E-Content",
            Cap::Limit(30.0),
            vec![
                CategoryRule::per_unit("mooc_module", "MOOC module published", 15.0),
                CategoryRule::per_divisor(
                    "video_lectures",
                    "Video lectures (5 marks per 5 videos)",
                    UnitKind::Count,
                    5.0,
                    5.0,
                ),
            ],
        ),
    ];

    let cadre_caps = BTreeMap::from([
        (Cadre::Professor, Cap::Limit(272.0)),
        (Cadre::AssociateProfessor, Cap::Limit(272.0)),
        (Cadre::AssistantProfessor, Cap::Limit(272.0)),
    ]);

    let cadre_multipliers = BTreeMap::from([
        (Cadre::Professor, 0.68),
        (Cadre::AssociateProfessor, 0.818),
        (Cadre::AssistantProfessor, 1.0),
    ]);

    FormRubric {
        form: FormKind::Teaching,
        sections,
        cadre_caps,
        cadre_multipliers: Some(cadre_multipliers),
    }
}
