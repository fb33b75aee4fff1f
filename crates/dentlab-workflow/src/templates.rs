//! 病例流程模板
//!
//! 每个类别对应一条固定顺序的部门流程

use dentlab_core::{CaseCategory, Department, WorkflowStep};

const FIXED: &[Department] = &[
    Department::Reception,
    Department::ModelRoom,
    Department::CadDesign,
    Department::Milling,
    Department::Ceramics,
    Department::QualityControl,
    Department::Shipping,
];

const REMOVABLE: &[Department] = &[
    Department::Reception,
    Department::ModelRoom,
    Department::WaxSetup,
    Department::Acrylic,
    Department::QualityControl,
    Department::Shipping,
];

const ORTHODONTICS: &[Department] = &[
    Department::Reception,
    Department::ModelRoom,
    Department::CadDesign,
    Department::Orthodontics,
    Department::QualityControl,
    Department::Shipping,
];

/// 类别对应的部门顺序
pub fn workflow_template(category: CaseCategory) -> &'static [Department] {
    match category {
        CaseCategory::Fixed => FIXED,
        CaseCategory::Removable => REMOVABLE,
        CaseCategory::Orthodontics => ORTHODONTICS,
    }
}

/// 按模板生成全部为待处理状态的工序
pub fn build_workflow(category: CaseCategory) -> Vec<WorkflowStep> {
    workflow_template(category)
        .iter()
        .copied()
        .map(WorkflowStep::pending)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentlab_core::StepStatus;

    #[test]
    fn test_fixed_template_order() {
        let departments: Vec<_> = build_workflow(CaseCategory::Fixed)
            .into_iter()
            .map(|s| s.department)
            .collect();
        assert_eq!(departments, FIXED.to_vec());
        assert_eq!(departments.first(), Some(&Department::Reception));
        assert_eq!(departments.last(), Some(&Department::Shipping));
    }

    #[test]
    fn test_removable_and_orthodontics_templates() {
        assert_eq!(
            workflow_template(CaseCategory::Removable),
            &[
                Department::Reception,
                Department::ModelRoom,
                Department::WaxSetup,
                Department::Acrylic,
                Department::QualityControl,
                Department::Shipping,
            ]
        );
        assert!(workflow_template(CaseCategory::Orthodontics).contains(&Department::Orthodontics));
        assert!(!workflow_template(CaseCategory::Orthodontics).contains(&Department::Ceramics));
    }

    #[test]
    fn test_templates_have_unique_departments() {
        for category in [CaseCategory::Fixed, CaseCategory::Removable, CaseCategory::Orthodontics] {
            let template = workflow_template(category);
            let unique: std::collections::HashSet<_> = template.iter().collect();
            assert_eq!(unique.len(), template.len());
        }
    }

    #[test]
    fn test_build_workflow_all_pending() {
        let steps = build_workflow(CaseCategory::Removable);
        assert!(steps.iter().all(|s| s.status == StepStatus::Pending && s.assigned_staff.is_none()));
    }
}
