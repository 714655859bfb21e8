use super::*;

impl Workbook {
    /// Add a chart to a sheet, anchored between two cells.
    ///
    /// The chart spans from `from_cell` (e.g., `"B2"`) to `to_cell`
    /// (e.g., `"J15"`). The `config` specifies the chart type, series data,
    /// title, and legend visibility.
    pub fn add_chart(
        &mut self,
        sheet: &str,
        from_cell: &str,
        to_cell: &str,
        config: &ChartConfig,
    ) -> Result<()> {
        let sheet_idx =
            crate::sheet::find_sheet_index(&self.worksheets, sheet).ok_or_else(|| {
                Error::SheetNotFound {
                    name: sheet.to_string(),
                }
            })?;

        // Parse cell references to marker coordinates (0-based).
        let (from_col, from_row) = cell_name_to_coordinates(from_cell)?;
        let (to_col, to_row) = cell_name_to_coordinates(to_cell)?;

        let from_marker = MarkerType {
            col: from_col - 1,
            col_off: 0,
            row: from_row - 1,
            row_off: 0,
        };
        let to_marker = MarkerType {
            col: to_col - 1,
            col_off: 0,
            row: to_row - 1,
            row_off: 0,
        };

        // Allocate chart part.
        let chart_num = self.charts.len() + 1;
        let chart_path = format!("xl/charts/chart{}.xml", chart_num);
        let chart_space = crate::chart::build_chart_xml(config);
        self.charts.push((chart_path, chart_space));

        // Get or create drawing for this sheet.
        let drawing_idx = self.ensure_drawing_for_sheet(sheet_idx);

        // Add chart reference to the drawing's relationships.
        let chart_rid = self.next_drawing_rid(drawing_idx);
        let chart_rel_target = format!("../charts/chart{}.xml", chart_num);

        let dr_rels = self
            .drawing_rels
            .entry(drawing_idx)
            .or_insert_with(|| Relationships {
                xmlns: sheetkit_xml::namespaces::PACKAGE_RELATIONSHIPS.to_string(),
                relationships: vec![],
            });
        dr_rels.relationships.push(Relationship {
            id: chart_rid.clone(),
            rel_type: rel_types::CHART.to_string(),
            target: chart_rel_target,
            target_mode: None,
        });

        // Build the chart anchor and add it to the drawing.
        let drawing = &mut self.drawings[drawing_idx].1;
        let anchor = crate::chart::build_drawing_with_chart(&chart_rid, from_marker, to_marker);
        drawing.two_cell_anchors.extend(anchor.two_cell_anchors);

        // Add content type for the chart.
        self.content_types.overrides.push(ContentTypeOverride {
            part_name: format!("/xl/charts/chart{}.xml", chart_num),
            content_type: mime_types::CHART.to_string(),
        });

        Ok(())
    }

    /// Add a shape to a sheet, anchored between two cells.
    ///
    /// The shape spans from `config.from_cell` to `config.to_cell`. Unlike
    /// charts and images, shapes do not reference external parts and therefore
    /// do not need a relationship entry.
    pub fn add_shape(&mut self, sheet: &str, config: &crate::shape::ShapeConfig) -> Result<()> {
        let sheet_idx =
            crate::sheet::find_sheet_index(&self.worksheets, sheet).ok_or_else(|| {
                Error::SheetNotFound {
                    name: sheet.to_string(),
                }
            })?;

        let drawing_idx = self.ensure_drawing_for_sheet(sheet_idx);

        let drawing = &mut self.drawings[drawing_idx].1;
        let shape_id = (drawing.one_cell_anchors.len() + drawing.two_cell_anchors.len() + 2) as u32;

        let anchor = crate::shape::build_shape_anchor(config, shape_id)?;
        drawing.two_cell_anchors.push(anchor);

        Ok(())
    }

    /// Add an image to a sheet from bytes.
    ///
    /// The image is anchored to the cell specified in `config.from_cell`.
    /// Dimensions are specified in pixels via `config.width_px` and
    /// `config.height_px`.
    pub fn add_image(&mut self, sheet: &str, config: &ImageConfig) -> Result<()> {
        crate::image::validate_image_config(config)?;

        let sheet_idx =
            crate::sheet::find_sheet_index(&self.worksheets, sheet).ok_or_else(|| {
                Error::SheetNotFound {
                    name: sheet.to_string(),
                }
            })?;

        // Allocate image media part.
        let image_num = self.images.len() + 1;
        let image_path = format!("xl/media/image{}.{}", image_num, config.format.extension());
        self.images.push((image_path, config.data.clone()));

        // Ensure the image extension has a default content type.
        let ext = config.format.extension().to_string();
        if !self
            .content_types
            .defaults
            .iter()
            .any(|d| d.extension == ext)
        {
            self.content_types.defaults.push(ContentTypeDefault {
                extension: ext,
                content_type: config.format.content_type().to_string(),
            });
        }

        // Get or create drawing for this sheet.
        let drawing_idx = self.ensure_drawing_for_sheet(sheet_idx);

        // Add image reference to the drawing's relationships.
        let image_rid = self.next_drawing_rid(drawing_idx);
        let image_rel_target = format!("../media/image{}.{}", image_num, config.format.extension());

        let dr_rels = self
            .drawing_rels
            .entry(drawing_idx)
            .or_insert_with(|| Relationships {
                xmlns: sheetkit_xml::namespaces::PACKAGE_RELATIONSHIPS.to_string(),
                relationships: vec![],
            });
        dr_rels.relationships.push(Relationship {
            id: image_rid.clone(),
            rel_type: rel_types::IMAGE.to_string(),
            target: image_rel_target,
            target_mode: None,
        });

        // Count existing objects in the drawing to assign a unique ID.
        let drawing = &mut self.drawings[drawing_idx].1;
        let pic_id = (drawing.one_cell_anchors.len() + drawing.two_cell_anchors.len() + 2) as u32;

        // Add image anchor to the drawing.
        crate::image::add_image_to_drawing(drawing, &image_rid, config, pic_id)?;

        Ok(())
    }

    /// Delete a chart anchored at the given cell.
    ///
    /// Removes the drawing anchor, chart data, relationship entry, and content
    /// type override for the chart at `cell` on `sheet`.
    pub fn delete_chart(&mut self, sheet: &str, cell: &str) -> Result<()> {
        let sheet_idx = self.sheet_index(sheet)?;
        let (col, row) = cell_name_to_coordinates(cell)?;
        let target_col = col - 1;
        let target_row = row - 1;

        let &drawing_idx =
            self.worksheet_drawings
                .get(&sheet_idx)
                .ok_or_else(|| Error::ChartNotFound {
                    sheet: sheet.to_string(),
                    cell: cell.to_string(),
                })?;

        let drawing = &self.drawings[drawing_idx].1;
        let anchor_pos = drawing
            .two_cell_anchors
            .iter()
            .position(|a| {
                a.from.col == target_col && a.from.row == target_row && a.graphic_frame.is_some()
            })
            .ok_or_else(|| Error::ChartNotFound {
                sheet: sheet.to_string(),
                cell: cell.to_string(),
            })?;

        let anchor = &drawing.two_cell_anchors[anchor_pos];
        let chart_rid = anchor
            .graphic_frame
            .as_ref()
            .unwrap()
            .graphic
            .graphic_data
            .chart
            .r_id
            .clone();

        let chart_path = self
            .drawing_rels
            .get(&drawing_idx)
            .and_then(|rels| {
                rels.relationships
                    .iter()
                    .find(|r| r.id == chart_rid)
                    .map(|r| {
                        let drawing_path = &self.drawings[drawing_idx].0;
                        let base_dir = drawing_path
                            .rfind('/')
                            .map(|i| &drawing_path[..i])
                            .unwrap_or("");
                        if r.target.starts_with("../") {
                            let rel_target = r.target.trim_start_matches("../");
                            let parent = base_dir.rfind('/').map(|i| &base_dir[..i]).unwrap_or("");
                            if parent.is_empty() {
                                rel_target.to_string()
                            } else {
                                format!("{}/{}", parent, rel_target)
                            }
                        } else {
                            format!("{}/{}", base_dir, r.target)
                        }
                    })
            })
            .ok_or_else(|| Error::ChartNotFound {
                sheet: sheet.to_string(),
                cell: cell.to_string(),
            })?;

        self.charts.retain(|(path, _)| path != &chart_path);
        self.raw_charts.retain(|(path, _)| path != &chart_path);

        if let Some(rels) = self.drawing_rels.get_mut(&drawing_idx) {
            rels.relationships.retain(|r| r.id != chart_rid);
        }

        self.drawings[drawing_idx]
            .1
            .two_cell_anchors
            .remove(anchor_pos);

        let ct_part_name = format!("/{}", chart_path);
        self.content_types
            .overrides
            .retain(|o| o.part_name != ct_part_name);

        Ok(())
    }

    /// Delete a picture anchored at the given cell.
    ///
    /// Removes the drawing anchor, image data, relationship entry, and content
    /// type for the picture at `cell` on `sheet`. Searches both one-cell and
    /// two-cell anchors.
    pub fn delete_picture(&mut self, sheet: &str, cell: &str) -> Result<()> {
        let sheet_idx = self.sheet_index(sheet)?;
        let (col, row) = cell_name_to_coordinates(cell)?;
        let target_col = col - 1;
        let target_row = row - 1;

        let &drawing_idx =
            self.worksheet_drawings
                .get(&sheet_idx)
                .ok_or_else(|| Error::PictureNotFound {
                    sheet: sheet.to_string(),
                    cell: cell.to_string(),
                })?;

        let drawing = &self.drawings[drawing_idx].1;

        // Check one-cell anchors first
        if let Some(pos) = drawing
            .one_cell_anchors
            .iter()
            .position(|a| a.from.col == target_col && a.from.row == target_row && a.pic.is_some())
        {
            let image_rid = drawing.one_cell_anchors[pos]
                .pic
                .as_ref()
                .unwrap()
                .blip_fill
                .blip
                .r_embed
                .clone();

            self.remove_picture_data(drawing_idx, &image_rid);
            self.drawings[drawing_idx].1.one_cell_anchors.remove(pos);
            return Ok(());
        }

        // Check two-cell anchors
        if let Some(pos) = drawing
            .two_cell_anchors
            .iter()
            .position(|a| a.from.col == target_col && a.from.row == target_row && a.pic.is_some())
        {
            let image_rid = drawing.two_cell_anchors[pos]
                .pic
                .as_ref()
                .unwrap()
                .blip_fill
                .blip
                .r_embed
                .clone();

            self.remove_picture_data(drawing_idx, &image_rid);
            self.drawings[drawing_idx].1.two_cell_anchors.remove(pos);
            return Ok(());
        }

        Err(Error::PictureNotFound {
            sheet: sheet.to_string(),
            cell: cell.to_string(),
        })
    }

    /// Remove image data, relationship, and content type for a picture reference.
    fn remove_picture_data(&mut self, drawing_idx: usize, image_rid: &str) {
        if let Some(image_path) = self.resolve_drawing_rel_target(drawing_idx, image_rid) {
            self.images.retain(|(path, _)| path != &image_path);
        }

        if let Some(rels) = self.drawing_rels.get_mut(&drawing_idx) {
            rels.relationships.retain(|r| r.id != image_rid);
        }
    }

    /// Resolve a relationship target to a full zip path.
    fn resolve_drawing_rel_target(&self, drawing_idx: usize, rid: &str) -> Option<String> {
        self.drawing_rels.get(&drawing_idx).and_then(|rels| {
            rels.relationships.iter().find(|r| r.id == rid).map(|r| {
                let drawing_path = &self.drawings[drawing_idx].0;
                let base_dir = drawing_path
                    .rfind('/')
                    .map(|i| &drawing_path[..i])
                    .unwrap_or("");
                if r.target.starts_with("../") {
                    let rel_target = r.target.trim_start_matches("../");
                    let parent = base_dir.rfind('/').map(|i| &base_dir[..i]).unwrap_or("");
                    if parent.is_empty() {
                        rel_target.to_string()
                    } else {
                        format!("{}/{}", parent, rel_target)
                    }
                } else {
                    format!("{}/{}", base_dir, r.target)
                }
            })
        })
    }

    /// Get all pictures anchored at the given cell.
    ///
    /// Returns picture data, format, anchor cell, and dimensions for each
    /// picture found at the specified cell.
    pub fn get_pictures(&self, sheet: &str, cell: &str) -> Result<Vec<crate::image::PictureInfo>> {
        let sheet_idx = self.sheet_index(sheet)?;
        let (col, row) = cell_name_to_coordinates(cell)?;
        let target_col = col - 1;
        let target_row = row - 1;

        let drawing_idx = match self.worksheet_drawings.get(&sheet_idx) {
            Some(&idx) => idx,
            None => return Ok(vec![]),
        };

        let drawing = &self.drawings[drawing_idx].1;
        let mut results = Vec::new();

        for anchor in &drawing.one_cell_anchors {
            if anchor.from.col == target_col && anchor.from.row == target_row {
                if let Some(pic) = &anchor.pic {
                    if let Some(info) = self.extract_picture_info(drawing_idx, pic, cell) {
                        results.push(info);
                    }
                }
            }
        }

        for anchor in &drawing.two_cell_anchors {
            if anchor.from.col == target_col && anchor.from.row == target_row {
                if let Some(pic) = &anchor.pic {
                    if let Some(info) = self.extract_picture_info(drawing_idx, pic, cell) {
                        results.push(info);
                    }
                }
            }
        }

        Ok(results)
    }

    /// Extract picture info from a Picture element by resolving its relationship.
    fn extract_picture_info(
        &self,
        drawing_idx: usize,
        pic: &sheetkit_xml::drawing::Picture,
        cell: &str,
    ) -> Option<crate::image::PictureInfo> {
        let rid = &pic.blip_fill.blip.r_embed;
        let image_path = self.resolve_drawing_rel_target(drawing_idx, rid)?;
        let (data, format) = self.find_image_with_format(&image_path)?;

        let cx = pic.sp_pr.xfrm.ext.cx;
        let cy = pic.sp_pr.xfrm.ext.cy;
        let width_px = (cx / crate::image::EMU_PER_PIXEL) as u32;
        let height_px = (cy / crate::image::EMU_PER_PIXEL) as u32;

        Some(crate::image::PictureInfo {
            data: data.clone(),
            format,
            cell: cell.to_string(),
            width_px,
            height_px,
        })
    }

    /// Find image data and determine format from the zip path extension.
    fn find_image_with_format(
        &self,
        image_path: &str,
    ) -> Option<(&Vec<u8>, crate::image::ImageFormat)> {
        self.images
            .iter()
            .find(|(p, _)| p == image_path)
            .and_then(|(path, data)| {
                let ext = path.rsplit('.').next()?;
                let format = crate::image::ImageFormat::from_extension(ext).ok()?;
                Some((data, format))
            })
    }

    /// Get all cells that have pictures anchored to them on the given sheet.
    pub fn get_picture_cells(&self, sheet: &str) -> Result<Vec<String>> {
        let sheet_idx = self.sheet_index(sheet)?;

        let drawing_idx = match self.worksheet_drawings.get(&sheet_idx) {
            Some(&idx) => idx,
            None => return Ok(vec![]),
        };

        let drawing = &self.drawings[drawing_idx].1;
        let mut cells = Vec::new();

        for anchor in &drawing.one_cell_anchors {
            if anchor.pic.is_some() {
                if let Ok(name) = crate::utils::cell_ref::coordinates_to_cell_name(
                    anchor.from.col + 1,
                    anchor.from.row + 1,
                ) {
                    cells.push(name);
                }
            }
        }

        for anchor in &drawing.two_cell_anchors {
            if anchor.pic.is_some() {
                if let Ok(name) = crate::utils::cell_ref::coordinates_to_cell_name(
                    anchor.from.col + 1,
                    anchor.from.row + 1,
                ) {
                    cells.push(name);
                }
            }
        }

        Ok(cells)
    }
}
