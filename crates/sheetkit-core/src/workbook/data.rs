use super::*;

impl Workbook {
    /// Add a pivot table to the workbook.
    ///
    /// The pivot table summarizes data from `config.source_sheet` /
    /// `config.source_range` and places its output on `config.target_sheet`
    /// starting at `config.target_cell`.
    pub fn add_pivot_table(&mut self, config: &PivotTableConfig) -> Result<()> {
        // Validate source sheet exists.
        let _src_idx = self.sheet_index(&config.source_sheet)?;

        // Validate target sheet exists.
        let target_idx = self.sheet_index(&config.target_sheet)?;

        // Check for duplicate name.
        if self
            .pivot_tables
            .iter()
            .any(|(_, pt)| pt.name == config.name)
        {
            return Err(Error::PivotTableAlreadyExists {
                name: config.name.clone(),
            });
        }

        // Read header row from the source data.
        let field_names = self.read_header_row(&config.source_sheet, &config.source_range)?;
        if field_names.is_empty() {
            return Err(Error::InvalidSourceRange(
                "source range header row is empty".to_string(),
            ));
        }

        // Assign a cache ID (next available).
        let cache_id = self
            .pivot_tables
            .iter()
            .map(|(_, pt)| pt.cache_id)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);

        // Build XML structures.
        let pt_def = crate::pivot::build_pivot_table_xml(config, cache_id, &field_names)?;
        let pcd = crate::pivot::build_pivot_cache_definition(
            &config.source_sheet,
            &config.source_range,
            &field_names,
        );
        let pcr = sheetkit_xml::pivot_cache::PivotCacheRecords {
            xmlns: sheetkit_xml::namespaces::SPREADSHEET_ML.to_string(),
            xmlns_r: sheetkit_xml::namespaces::RELATIONSHIPS.to_string(),
            count: Some(0),
            records: vec![],
        };

        // Determine part numbers.
        let pt_num = self.pivot_tables.len() + 1;
        let cache_num = self.pivot_cache_defs.len() + 1;

        let pt_path = format!("xl/pivotTables/pivotTable{}.xml", pt_num);
        let pcd_path = format!("xl/pivotCache/pivotCacheDefinition{}.xml", cache_num);
        let pcr_path = format!("xl/pivotCache/pivotCacheRecords{}.xml", cache_num);

        // Store parts.
        self.pivot_tables.push((pt_path.clone(), pt_def));
        self.pivot_cache_defs.push((pcd_path.clone(), pcd));
        self.pivot_cache_records.push((pcr_path.clone(), pcr));

        // Add content type overrides.
        self.content_types.overrides.push(ContentTypeOverride {
            part_name: format!("/{}", pt_path),
            content_type: mime_types::PIVOT_TABLE.to_string(),
        });
        self.content_types.overrides.push(ContentTypeOverride {
            part_name: format!("/{}", pcd_path),
            content_type: mime_types::PIVOT_CACHE_DEFINITION.to_string(),
        });
        self.content_types.overrides.push(ContentTypeOverride {
            part_name: format!("/{}", pcr_path),
            content_type: mime_types::PIVOT_CACHE_RECORDS.to_string(),
        });

        // Add workbook relationship for pivot cache definition.
        let wb_rid = crate::sheet::next_rid(&self.workbook_rels.relationships);
        self.workbook_rels.relationships.push(Relationship {
            id: wb_rid.clone(),
            rel_type: rel_types::PIVOT_CACHE_DEF.to_string(),
            target: format!("pivotCache/pivotCacheDefinition{}.xml", cache_num),
            target_mode: None,
        });

        // Update workbook_xml.pivot_caches.
        let pivot_caches = self
            .workbook_xml
            .pivot_caches
            .get_or_insert_with(|| sheetkit_xml::workbook::PivotCaches { caches: vec![] });
        pivot_caches
            .caches
            .push(sheetkit_xml::workbook::PivotCacheEntry {
                cache_id,
                r_id: wb_rid,
            });

        // Add worksheet relationship for pivot table on the target sheet.
        let ws_rid = self.next_worksheet_rid(target_idx);
        let ws_rels = self
            .worksheet_rels
            .entry(target_idx)
            .or_insert_with(|| Relationships {
                xmlns: sheetkit_xml::namespaces::PACKAGE_RELATIONSHIPS.to_string(),
                relationships: vec![],
            });
        ws_rels.relationships.push(Relationship {
            id: ws_rid,
            rel_type: rel_types::PIVOT_TABLE.to_string(),
            target: format!("../pivotTables/pivotTable{}.xml", pt_num),
            target_mode: None,
        });

        Ok(())
    }

    /// Get information about all pivot tables in the workbook.
    pub fn get_pivot_tables(&self) -> Vec<PivotTableInfo> {
        self.pivot_tables
            .iter()
            .map(|(_path, pt)| {
                // Find the matching cache definition by cache_id.
                let (source_sheet, source_range) = self
                    .pivot_cache_defs
                    .iter()
                    .enumerate()
                    .find(|(i, _)| {
                        self.workbook_xml
                            .pivot_caches
                            .as_ref()
                            .and_then(|pc| pc.caches.iter().find(|e| e.cache_id == pt.cache_id))
                            .is_some()
                            || *i == pt.cache_id as usize
                    })
                    .and_then(|(_, (_, pcd))| {
                        pcd.cache_source
                            .worksheet_source
                            .as_ref()
                            .map(|ws| (ws.sheet.clone(), ws.reference.clone()))
                    })
                    .unwrap_or_default();

                // Determine target sheet from the pivot table path.
                let target_sheet = self.find_pivot_table_target_sheet(pt).unwrap_or_default();

                PivotTableInfo {
                    name: pt.name.clone(),
                    source_sheet,
                    source_range,
                    target_sheet,
                    location: pt.location.reference.clone(),
                }
            })
            .collect()
    }

    /// Delete a pivot table by name.
    pub fn delete_pivot_table(&mut self, name: &str) -> Result<()> {
        // Find the pivot table.
        let pt_idx = self
            .pivot_tables
            .iter()
            .position(|(_, pt)| pt.name == name)
            .ok_or_else(|| Error::PivotTableNotFound {
                name: name.to_string(),
            })?;

        let (pt_path, pt_def) = self.pivot_tables.remove(pt_idx);
        let cache_id = pt_def.cache_id;

        // Remove the matching pivot cache definition and records.
        // Find the workbook_xml pivot cache entry for this cache_id.
        let mut wb_cache_rid = None;
        if let Some(ref mut pivot_caches) = self.workbook_xml.pivot_caches {
            if let Some(pos) = pivot_caches
                .caches
                .iter()
                .position(|e| e.cache_id == cache_id)
            {
                wb_cache_rid = Some(pivot_caches.caches[pos].r_id.clone());
                pivot_caches.caches.remove(pos);
            }
            if pivot_caches.caches.is_empty() {
                self.workbook_xml.pivot_caches = None;
            }
        }

        // Remove the workbook relationship for this cache.
        if let Some(ref rid) = wb_cache_rid {
            // Find the target to determine which cache def to remove.
            if let Some(rel) = self
                .workbook_rels
                .relationships
                .iter()
                .find(|r| r.id == *rid)
            {
                let target_path = format!("xl/{}", rel.target);
                self.pivot_cache_defs.retain(|(p, _)| *p != target_path);

                // Remove matching cache records (same numbering).
                let records_path = target_path.replace("pivotCacheDefinition", "pivotCacheRecords");
                self.pivot_cache_records.retain(|(p, _)| *p != records_path);
            }
            self.workbook_rels.relationships.retain(|r| r.id != *rid);
        }

        // Remove content type overrides for the removed parts.
        let pt_part = format!("/{}", pt_path);
        self.content_types
            .overrides
            .retain(|o| o.part_name != pt_part);

        // Also remove cache def and records content types if the paths were removed.
        self.content_types.overrides.retain(|o| {
            let p = o.part_name.trim_start_matches('/');
            // Keep if it is still in our live lists.
            if o.content_type == mime_types::PIVOT_CACHE_DEFINITION {
                return self.pivot_cache_defs.iter().any(|(path, _)| path == p);
            }
            if o.content_type == mime_types::PIVOT_CACHE_RECORDS {
                return self.pivot_cache_records.iter().any(|(path, _)| path == p);
            }
            if o.content_type == mime_types::PIVOT_TABLE {
                return self.pivot_tables.iter().any(|(path, _)| path == p);
            }
            true
        });

        // Remove worksheet relationship for this pivot table.
        for (_idx, rels) in self.worksheet_rels.iter_mut() {
            rels.relationships.retain(|r| {
                if r.rel_type != rel_types::PIVOT_TABLE {
                    return true;
                }
                // Check if the target matches the removed pivot table.
                let full_target = format!(
                    "xl/pivotTables/{}",
                    r.target.trim_start_matches("../pivotTables/")
                );
                full_target != pt_path
            });
        }

        Ok(())
    }

    /// Add a sparkline to a worksheet.
    pub fn add_sparkline(
        &mut self,
        sheet: &str,
        config: &crate::sparkline::SparklineConfig,
    ) -> Result<()> {
        let idx = self.sheet_index(sheet)?;
        crate::sparkline::validate_sparkline_config(config)?;
        while self.sheet_sparklines.len() <= idx {
            self.sheet_sparklines.push(vec![]);
        }
        self.sheet_sparklines[idx].push(config.clone());
        Ok(())
    }

    /// Get all sparklines for a worksheet.
    pub fn get_sparklines(&self, sheet: &str) -> Result<Vec<crate::sparkline::SparklineConfig>> {
        let idx = self.sheet_index(sheet)?;
        Ok(self.sheet_sparklines.get(idx).cloned().unwrap_or_default())
    }

    /// Remove a sparkline by its location cell reference.
    pub fn remove_sparkline(&mut self, sheet: &str, location: &str) -> Result<()> {
        let idx = self.sheet_index(sheet)?;
        let sparklines = self
            .sheet_sparklines
            .get_mut(idx)
            .ok_or_else(|| Error::Internal(format!("no sparkline data for sheet '{sheet}'")))?;
        let pos = sparklines
            .iter()
            .position(|s| s.location == location)
            .ok_or_else(|| {
                Error::Internal(format!(
                    "sparkline at location '{location}' not found on sheet '{sheet}'"
                ))
            })?;
        sparklines.remove(pos);
        Ok(())
    }

    /// Return `(col, row)` pairs for all occupied cells on the named sheet.
    pub fn get_occupied_cells(&self, sheet: &str) -> Result<Vec<(u32, u32)>> {
        let ws = self.worksheet_ref(sheet)?;
        let mut cells = Vec::new();
        for row in &ws.sheet_data.rows {
            for cell in &row.cells {
                if let Ok((c, r)) = cell_name_to_coordinates(cell.r.as_str()) {
                    cells.push((c, r));
                }
            }
        }
        Ok(cells)
    }

    /// Read the header row (first row) of a range from a sheet, returning cell
    /// values as strings.
    fn read_header_row(&self, sheet: &str, range: &str) -> Result<Vec<String>> {
        let parts: Vec<&str> = range.split(':').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidSourceRange(range.to_string()));
        }
        let (start_col, start_row) = cell_name_to_coordinates(parts[0])
            .map_err(|_| Error::InvalidSourceRange(range.to_string()))?;
        let (end_col, _end_row) = cell_name_to_coordinates(parts[1])
            .map_err(|_| Error::InvalidSourceRange(range.to_string()))?;

        let mut headers = Vec::new();
        for col in start_col..=end_col {
            let cell_name = crate::utils::cell_ref::coordinates_to_cell_name(col, start_row)?;
            let val = self.get_cell_value(sheet, &cell_name)?;
            let s = match val {
                CellValue::String(s) => s,
                CellValue::Number(n) => n.to_string(),
                CellValue::Bool(b) => b.to_string(),
                CellValue::RichString(runs) => crate::rich_text::rich_text_to_plain(&runs),
                _ => String::new(),
            };
            headers.push(s);
        }
        Ok(headers)
    }

    /// Find the target sheet name for a pivot table by looking at worksheet
    /// relationships that reference its path.
    fn find_pivot_table_target_sheet(
        &self,
        pt: &sheetkit_xml::pivot_table::PivotTableDefinition,
    ) -> Option<String> {
        // Find the pivot table path.
        let pt_path = self
            .pivot_tables
            .iter()
            .find(|(_, p)| p.name == pt.name)
            .map(|(path, _)| path.as_str())?;

        // Find which worksheet has a relationship pointing to this pivot table.
        for (sheet_idx, rels) in &self.worksheet_rels {
            for r in &rels.relationships {
                if r.rel_type == rel_types::PIVOT_TABLE {
                    let full_target = format!(
                        "xl/pivotTables/{}",
                        r.target.trim_start_matches("../pivotTables/")
                    );
                    if full_target == pt_path {
                        return self
                            .worksheets
                            .get(*sheet_idx)
                            .map(|(name, _)| name.clone());
                    }
                }
            }
        }
        None
    }

    /// Set the core document properties (title, author, etc.).
    pub fn set_doc_props(&mut self, props: crate::doc_props::DocProperties) {
        self.core_properties = Some(props.to_core_properties());
        self.ensure_doc_props_content_types();
    }

    /// Get the core document properties.
    pub fn get_doc_props(&self) -> crate::doc_props::DocProperties {
        self.core_properties
            .as_ref()
            .map(crate::doc_props::DocProperties::from)
            .unwrap_or_default()
    }

    /// Set the application properties (company, app version, etc.).
    pub fn set_app_props(&mut self, props: crate::doc_props::AppProperties) {
        self.app_properties = Some(props.to_extended_properties());
        self.ensure_doc_props_content_types();
    }

    /// Get the application properties.
    pub fn get_app_props(&self) -> crate::doc_props::AppProperties {
        self.app_properties
            .as_ref()
            .map(crate::doc_props::AppProperties::from)
            .unwrap_or_default()
    }

    /// Set a custom property by name. If a property with the same name already
    /// exists, its value is replaced.
    pub fn set_custom_property(
        &mut self,
        name: &str,
        value: crate::doc_props::CustomPropertyValue,
    ) {
        let props = self
            .custom_properties
            .get_or_insert_with(sheetkit_xml::doc_props::CustomProperties::default);
        crate::doc_props::set_custom_property(props, name, value);
        self.ensure_custom_props_content_types();
    }

    /// Get a custom property value by name, or `None` if it does not exist.
    pub fn get_custom_property(&self, name: &str) -> Option<crate::doc_props::CustomPropertyValue> {
        self.custom_properties
            .as_ref()
            .and_then(|p| crate::doc_props::find_custom_property(p, name))
    }

    /// Remove a custom property by name. Returns `true` if a property was
    /// found and removed.
    pub fn delete_custom_property(&mut self, name: &str) -> bool {
        if let Some(ref mut props) = self.custom_properties {
            crate::doc_props::delete_custom_property(props, name)
        } else {
            false
        }
    }

    /// Ensure content types contains entries for core and extended properties.
    fn ensure_doc_props_content_types(&mut self) {
        let core_part = "/docProps/core.xml";
        let app_part = "/docProps/app.xml";

        let has_core = self
            .content_types
            .overrides
            .iter()
            .any(|o| o.part_name == core_part);
        if !has_core {
            self.content_types.overrides.push(ContentTypeOverride {
                part_name: core_part.to_string(),
                content_type: mime_types::CORE_PROPERTIES.to_string(),
            });
        }

        let has_app = self
            .content_types
            .overrides
            .iter()
            .any(|o| o.part_name == app_part);
        if !has_app {
            self.content_types.overrides.push(ContentTypeOverride {
                part_name: app_part.to_string(),
                content_type: mime_types::EXTENDED_PROPERTIES.to_string(),
            });
        }
    }

    /// Ensure content types and package rels contain entries for custom properties.
    fn ensure_custom_props_content_types(&mut self) {
        self.ensure_doc_props_content_types();

        let custom_part = "/docProps/custom.xml";
        let has_custom = self
            .content_types
            .overrides
            .iter()
            .any(|o| o.part_name == custom_part);
        if !has_custom {
            self.content_types.overrides.push(ContentTypeOverride {
                part_name: custom_part.to_string(),
                content_type: mime_types::CUSTOM_PROPERTIES.to_string(),
            });
        }

        let has_custom_rel = self
            .package_rels
            .relationships
            .iter()
            .any(|r| r.rel_type == rel_types::CUSTOM_PROPERTIES);
        if !has_custom_rel {
            let next_id = self.package_rels.relationships.len() + 1;
            self.package_rels.relationships.push(Relationship {
                id: format!("rId{next_id}"),
                rel_type: rel_types::CUSTOM_PROPERTIES.to_string(),
                target: "docProps/custom.xml".to_string(),
                target_mode: None,
            });
        }
    }

    /// Look up a table by name across all sheets. Returns a reference to the
    /// table XML, path, and sheet index from the main table storage.
    fn find_table_by_name(
        &self,
        name: &str,
    ) -> Option<(&String, &sheetkit_xml::table::TableXml, usize)> {
        self.tables
            .iter()
            .find(|(_, t, _)| t.name == name)
            .map(|(path, t, idx)| (path, t, *idx))
    }

    /// Look up the table name for a given table ID.
    fn table_name_by_id(&self, table_id: u32) -> Option<&str> {
        self.tables
            .iter()
            .find(|(_, t, _)| t.id == table_id)
            .map(|(_, t, _)| t.name.as_str())
    }

    /// Look up the column name by 1-based column index and table ID.
    fn table_column_name_by_index(&self, table_id: u32, column_index: u32) -> Option<&str> {
        self.tables
            .iter()
            .find(|(_, t, _)| t.id == table_id)
            .and_then(|(_, t, _)| {
                t.table_columns
                    .columns
                    .get((column_index - 1) as usize)
                    .map(|c| c.name.as_str())
            })
    }

    /// Add a slicer to a sheet targeting a table column.
    ///
    /// Creates the slicer definition, slicer cache, content type overrides,
    /// and worksheet relationships needed for Excel to render the slicer.
    pub fn add_slicer(&mut self, sheet: &str, config: &crate::slicer::SlicerConfig) -> Result<()> {
        use sheetkit_xml::content_types::ContentTypeOverride;
        use sheetkit_xml::slicer::{
            SlicerCacheDefinition, SlicerDefinition, SlicerDefinitions, TableSlicerCache,
        };

        crate::slicer::validate_slicer_config(config)?;

        let sheet_idx = self.sheet_index(sheet)?;

        // Check for duplicate name across all slicer definitions.
        for (_, sd) in &self.slicer_defs {
            for s in &sd.slicers {
                if s.name == config.name {
                    return Err(Error::SlicerAlreadyExists {
                        name: config.name.clone(),
                    });
                }
            }
        }

        let cache_name = crate::slicer::slicer_cache_name(&config.name);
        let caption = config
            .caption
            .clone()
            .unwrap_or_else(|| config.column_name.clone());

        // Determine part numbers.
        let slicer_num = self.slicer_defs.len() + 1;
        let cache_num = self.slicer_caches.len() + 1;

        let slicer_path = format!("xl/slicers/slicer{}.xml", slicer_num);
        let cache_path = format!("xl/slicerCaches/slicerCache{}.xml", cache_num);

        // Build the slicer definition.
        let slicer_def = SlicerDefinition {
            name: config.name.clone(),
            cache: cache_name.clone(),
            caption: Some(caption),
            start_item: None,
            column_count: config.column_count,
            show_caption: config.show_caption,
            style: config.style.clone(),
            locked_position: None,
            row_height: crate::slicer::DEFAULT_ROW_HEIGHT_EMU,
        };

        let slicer_defs = SlicerDefinitions {
            xmlns: sheetkit_xml::namespaces::SLICER_2009.to_string(),
            xmlns_mc: Some(sheetkit_xml::namespaces::MC.to_string()),
            slicers: vec![slicer_def],
        };

        // Look up the actual table by name and validate it exists on this sheet.
        let (_path, table_xml, table_sheet_idx) = self
            .find_table_by_name(&config.table_name)
            .ok_or_else(|| Error::TableNotFound {
                name: config.table_name.clone(),
            })?;

        if table_sheet_idx != sheet_idx {
            return Err(Error::TableNotFound {
                name: config.table_name.clone(),
            });
        }

        // Validate the column exists in the table and get its 1-based index.
        let column_index = table_xml
            .table_columns
            .columns
            .iter()
            .position(|c| c.name == config.column_name)
            .ok_or_else(|| Error::TableColumnNotFound {
                table: config.table_name.clone(),
                column: config.column_name.clone(),
            })?;

        let real_table_id = table_xml.id;
        let real_column = (column_index + 1) as u32;

        // Build the slicer cache definition with real table metadata.
        let slicer_cache = SlicerCacheDefinition {
            name: cache_name.clone(),
            source_name: config.column_name.clone(),
            table_slicer_cache: Some(TableSlicerCache {
                table_id: real_table_id,
                column: real_column,
            }),
        };

        // Store parts.
        self.slicer_defs.push((slicer_path.clone(), slicer_defs));
        self.slicer_caches.push((cache_path.clone(), slicer_cache));

        // Add content type overrides.
        self.content_types.overrides.push(ContentTypeOverride {
            part_name: format!("/{}", slicer_path),
            content_type: mime_types::SLICER.to_string(),
        });
        self.content_types.overrides.push(ContentTypeOverride {
            part_name: format!("/{}", cache_path),
            content_type: mime_types::SLICER_CACHE.to_string(),
        });

        // Add workbook relationship for slicer cache.
        let wb_rid = crate::sheet::next_rid(&self.workbook_rels.relationships);
        self.workbook_rels.relationships.push(Relationship {
            id: wb_rid,
            rel_type: rel_types::SLICER_CACHE.to_string(),
            target: format!("slicerCaches/slicerCache{}.xml", cache_num),
            target_mode: None,
        });

        // Add worksheet relationship for slicer part.
        let ws_rid = self.next_worksheet_rid(sheet_idx);
        let ws_rels = self
            .worksheet_rels
            .entry(sheet_idx)
            .or_insert_with(|| Relationships {
                xmlns: sheetkit_xml::namespaces::PACKAGE_RELATIONSHIPS.to_string(),
                relationships: vec![],
            });
        ws_rels.relationships.push(Relationship {
            id: ws_rid,
            rel_type: rel_types::SLICER.to_string(),
            target: format!("../slicers/slicer{}.xml", slicer_num),
            target_mode: None,
        });

        Ok(())
    }

    /// Get information about all slicers on a sheet.
    pub fn get_slicers(&self, sheet: &str) -> Result<Vec<crate::slicer::SlicerInfo>> {
        let sheet_idx = self.sheet_index(sheet)?;
        let mut result = Vec::new();

        // Find slicer parts referenced by this sheet's relationships.
        let empty_rels = Relationships {
            xmlns: sheetkit_xml::namespaces::PACKAGE_RELATIONSHIPS.to_string(),
            relationships: vec![],
        };
        let rels = self.worksheet_rels.get(&sheet_idx).unwrap_or(&empty_rels);

        let slicer_targets: Vec<String> = rels
            .relationships
            .iter()
            .filter(|r| r.rel_type == rel_types::SLICER)
            .map(|r| {
                let sheet_path = self.sheet_part_path(sheet_idx);
                crate::workbook_paths::resolve_relationship_target(&sheet_path, &r.target)
            })
            .collect();

        for (path, sd) in &self.slicer_defs {
            if !slicer_targets.contains(path) {
                continue;
            }
            for slicer in &sd.slicers {
                // Find the matching cache to get source info.
                let cache = self
                    .slicer_caches
                    .iter()
                    .find(|(_, sc)| sc.name == slicer.cache);

                let (table_name, column_name) = if let Some((_, sc)) = cache {
                    let tname = sc
                        .table_slicer_cache
                        .as_ref()
                        .and_then(|tsc| self.table_name_by_id(tsc.table_id))
                        .unwrap_or("")
                        .to_string();
                    let cname = sc
                        .table_slicer_cache
                        .as_ref()
                        .and_then(|tsc| self.table_column_name_by_index(tsc.table_id, tsc.column))
                        .unwrap_or(&sc.source_name)
                        .to_string();
                    (tname, cname)
                } else {
                    (String::new(), String::new())
                };

                result.push(crate::slicer::SlicerInfo {
                    name: slicer.name.clone(),
                    caption: slicer
                        .caption
                        .clone()
                        .unwrap_or_else(|| slicer.name.clone()),
                    table_name,
                    column_name,
                    style: slicer.style.clone(),
                });
            }
        }

        Ok(result)
    }

    /// Delete a slicer by name from a sheet.
    ///
    /// Removes the slicer definition, cache, content types, and relationships.
    pub fn delete_slicer(&mut self, sheet: &str, name: &str) -> Result<()> {
        let sheet_idx = self.sheet_index(sheet)?;

        // Find the slicer definition containing this slicer name.
        let sd_idx = self
            .slicer_defs
            .iter()
            .position(|(_, sd)| sd.slicers.iter().any(|s| s.name == name))
            .ok_or_else(|| Error::SlicerNotFound {
                name: name.to_string(),
            })?;

        let (sd_path, sd) = &self.slicer_defs[sd_idx];

        // Find the cache name linked to this slicer.
        let cache_name = sd
            .slicers
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.cache.clone())
            .unwrap_or_default();

        // If this is the only slicer in this definitions part, remove the whole part.
        let remove_whole_part = sd.slicers.len() == 1;

        if remove_whole_part {
            let sd_path_clone = sd_path.clone();
            self.slicer_defs.remove(sd_idx);

            // Remove content type override.
            let sd_part = format!("/{}", sd_path_clone);
            self.content_types
                .overrides
                .retain(|o| o.part_name != sd_part);

            // Remove worksheet relationship pointing to this slicer part.
            let ws_path = self.sheet_part_path(sheet_idx);
            if let Some(rels) = self.worksheet_rels.get_mut(&sheet_idx) {
                rels.relationships.retain(|r| {
                    if r.rel_type != rel_types::SLICER {
                        return true;
                    }
                    let target =
                        crate::workbook_paths::resolve_relationship_target(&ws_path, &r.target);
                    target != sd_path_clone
                });
            }
        } else {
            // Remove just this slicer from the definitions.
            self.slicer_defs[sd_idx]
                .1
                .slicers
                .retain(|s| s.name != name);
        }

        // Remove the matching slicer cache.
        if !cache_name.is_empty() {
            if let Some(sc_idx) = self
                .slicer_caches
                .iter()
                .position(|(_, sc)| sc.name == cache_name)
            {
                let (sc_path, _) = self.slicer_caches.remove(sc_idx);
                let sc_part = format!("/{}", sc_path);
                self.content_types
                    .overrides
                    .retain(|o| o.part_name != sc_part);

                // Remove workbook relationship for this cache.
                self.workbook_rels.relationships.retain(|r| {
                    if r.rel_type != rel_types::SLICER_CACHE {
                        return true;
                    }
                    let full_target = format!("xl/{}", r.target);
                    full_target != sc_path
                });
            }
        }

        Ok(())
    }
}
